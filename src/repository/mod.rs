// ==========================================
// 学校管理门户 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 接收导入会话提交的记录批次，屏蔽持久化细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod memory_sink;
pub mod record_sink;
pub mod sqlite_record_store;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use memory_sink::InMemoryRecordSink;
pub use record_sink::{FnRecordSink, RecordSink};
pub use sqlite_record_store::SqliteRecordStore;
