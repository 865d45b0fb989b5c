// ==========================================
// 学校管理门户 - 领域层
// ==========================================
// 职责: 导入会话涉及的实体与类型定义
// ==========================================

pub mod field;
pub mod workbook;

pub use field::{ColumnAssignment, FieldMapping, MappedRecord, SourceKind, ValueKind};
pub use workbook::{CellValue, Sheet, Workbook};
