//! Trace ID 传播
//!
//! 当前 trace id 保存在线程局部存储中：显式传入的 id 会成为当前线程之后日志的 trace id，
//! 未设置时首次记录日志会生成一个 UUID v4。

use std::cell::RefCell;

thread_local! {
    static CURRENT_TRACE_ID: RefCell<Option<String>> = const { RefCell::new(None) };
}

pub fn current_trace_id() -> Option<String> {
    CURRENT_TRACE_ID.with(|id| id.borrow().clone())
}

pub fn set_trace_id(trace_id: impl Into<String>) {
    let trace_id = trace_id.into();
    CURRENT_TRACE_ID.with(|id| *id.borrow_mut() = Some(trace_id));
}

pub fn clear_trace_id() {
    CURRENT_TRACE_ID.with(|id| id.borrow_mut().take());
}

/// 确定本条日志使用的 trace id
pub fn ensure_trace_id(explicit: Option<&str>) -> String {
    if let Some(trace_id) = explicit {
        set_trace_id(trace_id);
    }

    CURRENT_TRACE_ID.with(|id| {
        id.borrow_mut()
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone()
    })
}
