//! 统一错误处理模块
//!
//! 定义 Data Nadhi 各组件共享的错误类型。规则引擎自身的配置错误见 `rule_engine::RuleError`。

use thiserror::Error;

/// 共享错误类型
#[derive(Debug, Error)]
pub enum NadhiError {
    // ==================== 配置错误 ====================
    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("缺少 API Key: 请显式传入或设置环境变量 {env_var}")]
    MissingApiKey { env_var: &'static str },

    // ==================== Pipeline 错误 ====================
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pipeline 触发失败: pipeline_id={pipeline_id}, status={status}")]
    PipelineTrigger { pipeline_id: String, status: u16 },
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, NadhiError>;

impl NadhiError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::MissingApiKey { .. } => "MISSING_API_KEY",
            Self::Http(_) => "HTTP_ERROR",
            Self::PipelineTrigger { .. } => "PIPELINE_TRIGGER_FAILED",
        }
    }

    /// 是否为可重试错误
    ///
    /// 网络超时、连接失败以及服务端 5xx 视为可重试。
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::PipelineTrigger { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = NadhiError::PipelineTrigger {
            pipeline_id: "alerts".to_string(),
            status: 404,
        };
        assert_eq!(err.code(), "PIPELINE_TRIGGER_FAILED");
        assert_eq!(
            NadhiError::MissingApiKey {
                env_var: "DATA_NADHI_API_KEY"
            }
            .code(),
            "MISSING_API_KEY"
        );
    }

    #[test]
    fn test_is_retryable() {
        let server_error = NadhiError::PipelineTrigger {
            pipeline_id: "alerts".to_string(),
            status: 503,
        };
        assert!(server_error.is_retryable());

        let client_error = NadhiError::PipelineTrigger {
            pipeline_id: "alerts".to_string(),
            status: 401,
        };
        assert!(!client_error.is_retryable());

        let missing = NadhiError::MissingApiKey {
            env_var: "DATA_NADHI_API_KEY",
        };
        assert!(!missing.is_retryable());
    }

    #[test]
    fn test_error_message() {
        let err = NadhiError::MissingApiKey {
            env_var: "DATA_NADHI_API_KEY",
        };
        assert!(err.to_string().contains("DATA_NADHI_API_KEY"));
    }
}
