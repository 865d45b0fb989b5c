// ==========================================
// 学校管理门户 - 配置管理器
// ==========================================
// 职责: 配置加载、查询
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::DEFAULT_EXTENSIONS;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 配置键
pub mod config_keys {
    pub const SUCCESS_CLOSE_DELAY_MS: &str = "import.success_close_delay_ms";
    pub const ACCEPTED_EXTENSIONS: &str = "import.accepted_extensions";
}

/// 默认自动关闭延迟（毫秒）
pub const DEFAULT_SUCCESS_CLOSE_DELAY_MS: u64 = 2_000;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ImportError::Database(format!("锁获取失败: {}", e)))?;
            configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::Database(format!("锁获取失败: {}", e)))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::Database(format!("锁获取失败: {}", e)))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_success_close_delay_ms(&self) -> ImportResult<u64> {
        let key = config_keys::SUCCESS_CLOSE_DELAY_MS;
        match self.get_config_value(key)? {
            None => Ok(DEFAULT_SUCCESS_CLOSE_DELAY_MS),
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ImportError::Config {
                key: key.to_string(),
                message: format!("无法解析为毫秒数 '{}': {}", raw, e),
            }),
        }
    }

    async fn get_accepted_extensions(&self) -> ImportResult<Vec<String>> {
        let key = config_keys::ACCEPTED_EXTENSIONS;
        let raw = match self.get_config_value(key)? {
            None => return Ok(DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()),
            Some(raw) => raw,
        };

        // 存储格式: JSON 数组，如 ["xlsx","xls"]
        let extensions: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| ImportError::Config {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        if extensions.is_empty() {
            return Err(ImportError::Config {
                key: key.to_string(),
                message: "扩展名列表为空".to_string(),
            });
        }
        Ok(extensions)
    }
}
