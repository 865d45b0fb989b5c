// ==========================================
// 学校管理门户 - Excel 批量导入映射器
// ==========================================
// 职责: 解析上传的多工作表 Excel 文件，自动推荐表头映射，
//       展开为扁平记录后整批交给调用方提交
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "fr");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 解析 / 映射 / 会话
pub mod importer;

// 数据仓储层 - 提交回调与持久化
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    CellValue, ColumnAssignment, FieldMapping, MappedRecord, Sheet, SourceKind, ValueKind,
    Workbook,
};

pub use importer::{ImportError, ImportResult, ImportSession, SessionState, SubmitOutcome};

pub use repository::{FnRecordSink, InMemoryRecordSink, RecordSink, SqliteRecordStore};

pub use config::{ConfigManager, ImportConfigReader, ImportSettings};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
