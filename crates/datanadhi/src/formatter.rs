//! stdout 日志格式化

use crate::payload::LogPayload;
use serde_json::json;

/// 日志格式化器
pub trait LogFormatter: Send + Sync {
    /// 格式化为一行输出（不含换行符）
    fn format(&self, payload: &LogPayload) -> String;
}

/// JSON 行格式
///
/// 输出字段：timestamp、module_name、function_name、line_number、level、message、trace_id、context
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl LogFormatter for JsonFormatter {
    fn format(&self, payload: &LogPayload) -> String {
        json!({
            "timestamp": payload.timestamp_string(),
            "module_name": payload.caller.module_name,
            "function_name": payload.caller.function_name,
            "line_number": payload.caller.line_number,
            "level": payload.level.as_str(),
            "message": payload.message,
            "trace_id": payload.trace_id,
            "context": payload.context,
        })
        .to_string()
    }
}
