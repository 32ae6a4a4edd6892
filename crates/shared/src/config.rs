//! 配置管理模块
//!
//! 支持多层配置文件加载、环境变量覆盖，以及类型安全的配置访问。

use crate::error::{NadhiError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 环境变量前缀（`DATANADHI_RULES__CONFIG_DIR` -> `rules.config_dir`）
pub const ENV_PREFIX: &str = "DATANADHI";

/// API Key 环境变量
pub const API_KEY_ENV: &str = "DATA_NADHI_API_KEY";

/// Pipeline 服务地址环境变量
pub const SERVER_HOST_ENV: &str = "NADHI_SERVER_HOST";

/// 规则配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// 规则文件目录
    pub config_dir: String,
    /// 是否监听规则文件变更
    pub watch: bool,
    pub debounce_ms: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            config_dir: ".datanadhi".to_string(),
            watch: false,
            debounce_ms: 200,
        }
    }
}

/// Pipeline 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub server_host: String,
    pub server_port: u16,
    pub timeout_seconds: u64,
    pub api_key: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            server_host: "http://data-nadhi-server".to_string(),
            server_port: 5000,
            timeout_seconds: 10,
            api_key: None,
        }
    }
}

impl PipelineConfig {
    /// 服务基础地址
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.server_host.trim_end_matches('/'), self.server_port)
    }

    /// Pipeline 触发接口地址
    pub fn trigger_url(&self) -> String {
        format!("{}/api/pipeline/trigger", self.server_url())
    }

    /// 解析 API Key
    ///
    /// 优先级：显式传入 > `DATA_NADHI_API_KEY` 环境变量 > 配置文件
    /// 空字符串视为未设置，继续查找下一来源
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String> {
        self.resolve_api_key_with(explicit, std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key_with(
        &self,
        explicit: Option<&str>,
        from_env: Option<String>,
    ) -> Result<String> {
        let non_empty = |key: &String| !key.is_empty();

        explicit
            .map(str::to_string)
            .filter(non_empty)
            .or_else(|| from_env.filter(non_empty))
            .or_else(|| self.api_key.clone().filter(non_empty))
            .ok_or(NadhiError::MissingApiKey {
                env_var: API_KEY_ENV,
            })
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn is_json(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub rules: RulesConfig,
    pub pipeline: PipelineConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（DATANADHI_ 前缀，`__` 分隔层级，如 DATANADHI_PIPELINE__SERVER_PORT）
    /// 5. 兼容环境变量 NADHI_SERVER_HOST
    pub fn load(service_name: &str) -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("DATANADHI_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), service_name, &env)
    }

    /// 从指定配置目录加载
    pub fn load_from(
        config_dir: &Path,
        service_name: &str,
        environment: &str,
    ) -> std::result::Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", environment)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", environment))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        if let Ok(host) = std::env::var(SERVER_HOST_ENV) {
            config.pipeline.server_host = host;
        }

        Ok(config)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
