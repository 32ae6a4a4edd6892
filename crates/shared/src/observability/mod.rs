//! 统一可观测性模块
//!
//! 提供 logging 与 metrics 的统一初始化。指标只通过 `metrics` facade 记录，
//! exporter 由嵌入方自行安装。

pub mod metrics;
pub mod tracing;

use crate::config::ObservabilityConfig;
use ::tracing::info;
use anyhow::Result;

/// 统一初始化可观测性
///
/// # Example
///
/// ```ignore
/// use nadhi_shared::config::AppConfig;
/// use nadhi_shared::observability;
///
/// let config = AppConfig::load("rule-engine")?;
/// observability::init(&config.service_name, &config.observability)?;
/// ```
pub fn init(service_name: &str, config: &ObservabilityConfig) -> Result<()> {
    tracing::init(config)?;
    metrics::describe();

    info!(
        service = %service_name,
        log_level = %config.log_level,
        log_format = %config.log_format,
        "Observability initialized"
    );

    Ok(())
}
