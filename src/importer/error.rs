// ==========================================
// 学校管理门户 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 所有错误在导入会话内就地处理，渲染为界面内联提示
// ==========================================

use crate::i18n::{t, t_with_args};
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("文件无法解析为电子表格: {0}")]
    UnreadableFile(String),

    #[error("工作簿中没有包含表头和数据行的工作表")]
    NoDataFound,

    // ===== 映射错误 =====
    #[error("必填字段未映射: {}", labels.join(", "))]
    MissingMapping { labels: Vec<String> },

    #[error("未声明的列字段: {0}")]
    UnknownField(String),

    // ===== 提交错误 =====
    #[error("提交被拒绝: {0}")]
    SubmitRejected(String),

    // ===== 会话状态错误 =====
    #[error("当前状态不允许该操作 (action={action}, state={state})")]
    InvalidState { action: String, state: String },

    // ===== 基础设施错误 =====
    #[error("数据库操作失败: {0}")]
    Database(String),

    #[error("配置读取失败 (key: {key}): {message}")]
    Config { key: String, message: String },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 面向用户的提示文本（按当前语言渲染）
    pub fn user_message(&self) -> String {
        match self {
            ImportError::FileNotFound(_) | ImportError::UnreadableFile(_) => {
                t("import.unreadable_file")
            }
            ImportError::UnsupportedFormat(ext) => {
                t_with_args("import.unsupported_format", &[("ext", ext.as_str())])
            }
            ImportError::NoDataFound => t("import.no_data_found"),
            ImportError::MissingMapping { labels } => {
                t_with_args("import.missing_mapping", &[("labels", labels.join(", ").as_str())])
            }
            ImportError::SubmitRejected(_) => t("import.submit_rejected"),
            ImportError::InvalidState { .. }
            | ImportError::UnknownField(_)
            | ImportError::Database(_)
            | ImportError::Config { .. }
            | ImportError::Other(_) => t("import.internal_error"),
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::UnreadableFile(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::UnreadableFile(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Database(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
