// ==========================================
// 学校管理门户 - 导入映射 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 工作簿解析 → 表头自动映射 → 记录展开 → 提交
// ==========================================

use crate::domain::{ColumnAssignment, FieldMapping, MappedRecord, Workbook};
use crate::importer::error::ImportResult;
use std::path::Path;

// ==========================================
// WorkbookParser Trait
// ==========================================
// 用途: 工作簿解析接口（阶段 0）
// 实现者: ExcelWorkbookParser
pub trait WorkbookParser: Send + Sync {
    /// 解析内存中的文件内容
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于扩展名校验）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(Workbook): 所有工作表（表头 + 非空数据行）
    /// - Err: UnsupportedFormat / UnreadableFile / NoDataFound
    fn parse_bytes(&self, file_name: &str, bytes: Vec<u8>) -> ImportResult<Workbook>;

    /// 解析磁盘上的文件
    fn parse_file(&self, file_path: &Path) -> ImportResult<Workbook>;
}

// ==========================================
// HeaderMatcher Trait
// ==========================================
// 用途: 表头自动映射接口（阶段 1）
// 实现者: KeywordHeaderMatcher
pub trait HeaderMatcher: Send + Sync {
    /// 为 COLUMN 字段推荐表头
    ///
    /// # 参数
    /// - fields: 字段声明（SHEET_NAME 字段被忽略）
    /// - headers: 规范工作表的表头
    ///
    /// # 返回
    /// - ColumnAssignment: 未命中的字段不出现在结果中
    fn suggest(&self, fields: &[FieldMapping], headers: &[String]) -> ColumnAssignment;
}

// ==========================================
// RecordFlattener Trait
// ==========================================
// 用途: 记录展开与校验接口（阶段 2）
// 实现者: FieldMapper
pub trait RecordFlattener: Send + Sync {
    /// 必填列字段均已映射，否则返回 MissingMapping
    fn validate_assignment(
        &self,
        fields: &[FieldMapping],
        assignment: &ColumnAssignment,
    ) -> ImportResult<()>;

    /// 展开所有工作表的数据行
    ///
    /// # 返回
    /// - Ok(Vec<MappedRecord>): 顺序 = 工作表顺序，再按行顺序
    /// - Err: MissingMapping（不产生任何记录）
    fn flatten(
        &self,
        workbook: &Workbook,
        fields: &[FieldMapping],
        assignment: &ColumnAssignment,
    ) -> ImportResult<Vec<MappedRecord>>;
}
