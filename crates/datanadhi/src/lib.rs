//! Data Nadhi 日志 SDK
//!
//! 每条日志先按规则评估：命中 `stdout` 的规则时以 JSON 行输出，
//! 命中的 pipeline 在后台异步触发，互不阻塞，也不会让日志调用失败。
//!
//! ```ignore
//! use datanadhi::DataNadhiLogger;
//! use serde_json::json;
//!
//! let logger = DataNadhiLogger::builder().module_name("my_app").build()?;
//! logger.info("User login", json!({"user": {"id": 123, "action": "login"}}), None);
//! ```

pub mod dispatch;
pub mod error;
pub mod formatter;
pub mod level;
pub mod logger;
pub mod payload;
pub mod trace;

pub use dispatch::{HttpPipelineDispatcher, NoopDispatcher, PipelineDispatcher};
pub use error::{LoggerError, Result};
pub use formatter::{JsonFormatter, LogFormatter};
pub use level::LogLevel;
pub use logger::{DEFAULT_MODULE_NAME, DataNadhiLogger, LoggerBuilder, RuleEvaluationResult};
pub use payload::{CallerInfo, LogPayload};
