//! Pipeline 触发
//!
//! 规则命中后，每个 pipeline 通过 `PipelineDispatcher` 独立触发。

use async_trait::async_trait;
use nadhi_shared::NadhiError;
use nadhi_shared::config::PipelineConfig;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument};

/// API Key 请求头
pub const API_KEY_HEADER: &str = "x-datanadhi-api-key";

/// Pipeline 触发器抽象
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PipelineDispatcher: Send + Sync {
    /// 触发一个 pipeline，返回服务端响应
    async fn trigger(&self, pipeline_id: &str, log_data: &Value) -> nadhi_shared::Result<Value>;
}

/// 通过 HTTP 调用 Data Nadhi 服务触发 pipeline
pub struct HttpPipelineDispatcher {
    client: reqwest::Client,
    trigger_url: String,
    api_key: String,
}

impl HttpPipelineDispatcher {
    pub fn new(config: &PipelineConfig, api_key: impl Into<String>) -> nadhi_shared::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            trigger_url: config.trigger_url(),
            api_key: api_key.into(),
        })
    }

    pub fn trigger_url(&self) -> &str {
        &self.trigger_url
    }
}

#[async_trait]
impl PipelineDispatcher for HttpPipelineDispatcher {
    #[instrument(skip(self, log_data), fields(url = %self.trigger_url))]
    async fn trigger(&self, pipeline_id: &str, log_data: &Value) -> nadhi_shared::Result<Value> {
        let response = self
            .client
            .post(&self.trigger_url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({
                "pipeline_id": pipeline_id,
                "log_data": log_data,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NadhiError::PipelineTrigger {
                pipeline_id: pipeline_id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(status = status.as_u16(), "pipeline 触发成功");

        // 响应体不是 JSON 时不视为失败
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }
}

/// 不做任何触发，用于离线或测试环境
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

#[async_trait]
impl PipelineDispatcher for NoopDispatcher {
    async fn trigger(&self, pipeline_id: &str, _log_data: &Value) -> nadhi_shared::Result<Value> {
        debug!(pipeline_id, "NoopDispatcher 忽略 pipeline 触发");
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_url_from_config() {
        let config = PipelineConfig {
            server_host: "http://localhost".to_string(),
            server_port: 5055,
            ..Default::default()
        };
        let dispatcher = HttpPipelineDispatcher::new(&config, "key").unwrap();
        assert_eq!(
            dispatcher.trigger_url(),
            "http://localhost:5055/api/pipeline/trigger"
        );
    }

    #[test]
    fn test_noop_dispatcher() {
        let result = tokio_test::block_on(NoopDispatcher.trigger("p", &json!({}))).unwrap();
        assert!(result.is_null());
    }

    #[tokio::test]
    async fn test_connection_refused_is_retryable() {
        let config = PipelineConfig {
            server_host: "http://127.0.0.1".to_string(),
            server_port: 1,
            timeout_seconds: 2,
            ..Default::default()
        };
        let dispatcher = HttpPipelineDispatcher::new(&config, "key").unwrap();

        let err = dispatcher.trigger("p", &json!({})).await.unwrap_err();
        assert_eq!(err.code(), "HTTP_ERROR");
        assert!(err.is_retryable());
    }
}
