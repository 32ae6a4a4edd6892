//! SDK 错误类型
//!
//! 只在构建 logger 时返回；日志调用本身从不失败。

use nadhi_shared::NadhiError;
use rule_engine::RuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("规则加载失败: {0}")]
    Rules(#[from] RuleError),

    #[error(transparent)]
    Shared(#[from] NadhiError),
}

pub type Result<T> = std::result::Result<T, LoggerError>;
