// ==========================================
// 学校管理门户 - SQLite 记录仓储
// ==========================================
// 职责: 将一次提交的整批记录写入 import_batch / import_record（事务化）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{configure_sqlite_connection, init_import_schema, open_sqlite_connection};
use crate::domain::MappedRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_sink::RecordSink;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

// ==========================================
// SqliteRecordStore
// ==========================================
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// 创建新的仓储实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_import_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_import_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中写入一个批次
    ///
    /// # 返回
    /// - Ok(String): 新批次 ID
    pub fn insert_batch(&self, records: &[MappedRecord]) -> RepositoryResult<String> {
        let batch_id = Uuid::new_v4().to_string();
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Self::insert_batch_tx(&tx, &batch_id, records)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(batch_id = %batch_id, records = records.len(), "导入批次已落库");
        Ok(batch_id)
    }

    fn insert_batch_tx(
        tx: &Transaction,
        batch_id: &str,
        records: &[MappedRecord],
    ) -> RepositoryResult<()> {
        tx.execute(
            "INSERT INTO import_batch (batch_id, record_count, created_at) VALUES (?1, ?2, ?3)",
            params![batch_id, records.len() as i64, Utc::now().to_rfc3339()],
        )?;

        let mut stmt = tx.prepare(
            "INSERT INTO import_record (batch_id, seq_no, payload_json) VALUES (?1, ?2, ?3)",
        )?;
        for (seq_no, record) in records.iter().enumerate() {
            let payload = serde_json::to_string(record)?;
            stmt.execute(params![batch_id, seq_no as i64, payload])?;
        }
        debug!(batch_id = %batch_id, "批次记录写入完成");
        Ok(())
    }

    /// 按写入顺序读取批次记录
    pub fn list_batch_records(&self, batch_id: &str) -> RepositoryResult<Vec<MappedRecord>> {
        let conn = self.lock()?;

        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM import_batch WHERE batch_id = ?1",
            params![batch_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ImportBatch".to_string(),
                id: batch_id.to_string(),
            });
        }

        let mut stmt = conn.prepare(
            "SELECT payload_json FROM import_record WHERE batch_id = ?1 ORDER BY seq_no",
        )?;
        let rows = stmt.query_map(params![batch_id], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for payload in rows {
            records.push(serde_json::from_str(&payload?)?);
        }
        Ok(records)
    }

    /// 批次 ID 列表（按创建时间）
    pub fn list_batch_ids(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT batch_id FROM import_batch ORDER BY created_at, rowid")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    }
}

#[async_trait]
impl RecordSink for SqliteRecordStore {
    async fn submit(&self, records: &[MappedRecord]) -> anyhow::Result<bool> {
        self.insert_batch(records)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteRecordStore {
        let conn = Connection::open_in_memory().unwrap();
        SqliteRecordStore::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_batch_round_trip_keeps_order() {
        let store = store();
        let records: Vec<MappedRecord> = vec![
            vec![("last_name", "Dupont"), ("first_name", "Marie")]
                .into_iter()
                .collect(),
            vec![("last_name", "Martin"), ("first_name", "Jean")]
                .into_iter()
                .collect(),
        ];

        let batch_id = store.insert_batch(&records).unwrap();

        assert_eq!(store.list_batch_records(&batch_id).unwrap(), records);
        assert_eq!(store.list_batch_ids().unwrap(), vec![batch_id]);
    }

    #[test]
    fn test_unknown_batch_is_not_found() {
        let store = store();
        let result = store.list_batch_records("missing");
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_submit_reports_success() {
        let store = store();
        assert!(store.submit(&[MappedRecord::new()]).await.unwrap());
        assert_eq!(store.list_batch_ids().unwrap().len(), 1);
    }
}
