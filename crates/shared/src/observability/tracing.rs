//! 日志初始化
//!
//! 基于 tracing-subscriber 构建日志输出，`RUST_LOG` 优先于配置中的日志级别。

use anyhow::Result;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ObservabilityConfig;

/// 构建环境过滤器
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化全局 tracing subscriber
///
/// 重复初始化会返回错误。
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    // 诊断日志写到 stderr，stdout 留给评估结果和日志回显
    let fmt_layer = if config.is_json() {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
