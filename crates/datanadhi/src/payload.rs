//! 日志 payload
//!
//! 规则评估与 pipeline 触发使用同一份 payload：
//!
//! ```json
//! {
//!   "message": "...",
//!   "trace_id": "...",
//!   "timestamp": "2026-01-01T08:15:30.123456Z",
//!   "log_record": {
//!     "filename": "src/main.rs",
//!     "function_name": null,
//!     "level": "INFO",
//!     "line_number": 42,
//!     "module_name": "my_app"
//!   },
//!   "context": {}
//! }
//! ```

use crate::level::LogLevel;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::panic::Location;

/// 日志调用位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerInfo {
    pub filename: String,
    pub line_number: u32,
    /// Rust 运行时无法获取调用方函数名，需要时由调用方显式提供
    pub function_name: Option<String>,
    pub module_name: String,
}

impl CallerInfo {
    pub fn from_location(location: &Location<'_>, module_name: impl Into<String>) -> Self {
        Self {
            filename: location.file().to_string(),
            line_number: location.line(),
            function_name: None,
            module_name: module_name.into(),
        }
    }

    pub fn with_function_name(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }
}

/// 一条日志
#[derive(Debug, Clone, PartialEq)]
pub struct LogPayload {
    pub message: String,
    pub trace_id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub caller: CallerInfo,
    pub context: Value,
}

impl LogPayload {
    /// UTC 时间，微秒精度，以 `Z` 结尾
    pub fn timestamp_string(&self) -> String {
        format_timestamp(&self.timestamp)
    }

    /// 转换为规则评估和 pipeline 使用的 JSON 结构
    pub fn to_value(&self) -> Value {
        json!({
            "message": self.message,
            "trace_id": self.trace_id,
            "timestamp": self.timestamp_string(),
            "log_record": {
                "filename": self.caller.filename,
                "function_name": self.caller.function_name,
                "level": self.level.as_str(),
                "line_number": self.caller.line_number,
                "module_name": self.caller.module_name,
            },
            "context": self.context,
        })
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    format!("{}Z", timestamp.format("%Y-%m-%dT%H:%M:%S%.6f"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> LogPayload {
        LogPayload {
            message: "User login".to_string(),
            trace_id: "t-1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 9, 20, 8, 15, 30).unwrap(),
            level: LogLevel::Info,
            caller: CallerInfo {
                filename: "src/main.rs".to_string(),
                line_number: 42,
                function_name: None,
                module_name: "my_app".to_string(),
            },
            context: json!({"user": {"id": 123}}),
        }
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(sample().timestamp_string(), "2025-09-20T08:15:30.000000Z");
    }

    #[test]
    fn test_to_value_layout() {
        let value = sample().to_value();

        assert_eq!(value["message"], "User login");
        assert_eq!(value["trace_id"], "t-1");
        assert_eq!(value["log_record"]["level"], "INFO");
        assert_eq!(value["log_record"]["line_number"], 42);
        assert_eq!(value["log_record"]["module_name"], "my_app");
        assert!(value["log_record"]["function_name"].is_null());
        assert_eq!(value["context"]["user"]["id"], 123);
    }

    #[test]
    fn test_caller_from_location() {
        let caller = CallerInfo::from_location(Location::caller(), "svc").with_function_name("run");
        assert!(caller.filename.ends_with("payload.rs"));
        assert_eq!(caller.function_name.as_deref(), Some("run"));
    }
}
