// ==========================================
// 学校管理门户 - 导入层
// ==========================================
// 职责: Excel 批量导入映射向导
// 流程: 解析 → 表头自动映射 → 人工确认 → 展开 → 整批提交
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod header_matcher;
pub mod import_mapper_trait;
pub mod import_session;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::ExcelWorkbookParser;
pub use header_matcher::KeywordHeaderMatcher;
pub use import_session::{
    ImportSession, PendingSubmission, SessionState, SubmissionSettlement, SubmitOutcome,
};

// 重导出 Trait 接口
pub use import_mapper_trait::{HeaderMatcher, RecordFlattener, WorkbookParser};
