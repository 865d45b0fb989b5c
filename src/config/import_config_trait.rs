// ==========================================
// 学校管理门户 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入会话所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入会话所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 提交成功后自动关闭对话框的延迟（毫秒）
    ///
    /// # 默认值
    /// - 2000
    async fn get_success_close_delay_ms(&self) -> ImportResult<u64>;

    /// 可接受的文件扩展名（不带点，小写）
    ///
    /// # 默认值
    /// - ["xlsx", "xls"]
    async fn get_accepted_extensions(&self) -> ImportResult<Vec<String>>;
}
