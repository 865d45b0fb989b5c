// ==========================================
// 学校管理门户 - 配置层
// ==========================================
// 职责: 导入会话配置（自动关闭延迟、可接受扩展名）
// 存储: config_kv 表，缺省时使用内置默认值
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

use crate::importer::error::ImportResult;
use crate::importer::file_parser::DEFAULT_EXTENSIONS;
use std::time::Duration;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_SUCCESS_CLOSE_DELAY_MS};
pub use import_config_trait::ImportConfigReader;

// ==========================================
// ImportSettings - 单次会话的配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub success_close_delay: Duration,
    pub accepted_extensions: Vec<String>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            success_close_delay: Duration::from_millis(DEFAULT_SUCCESS_CLOSE_DELAY_MS),
            accepted_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl ImportSettings {
    /// 从配置读取器加载
    pub async fn load<C: ImportConfigReader + ?Sized>(reader: &C) -> ImportResult<Self> {
        Ok(Self {
            success_close_delay: Duration::from_millis(reader.get_success_close_delay_ms().await?),
            accepted_extensions: reader.get_accepted_extensions().await?,
        })
    }
}
