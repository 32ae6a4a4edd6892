//! DataNadhiLogger
//!
//! 一次日志调用的流程：
//! 1. 确定 trace id 并构建 payload
//! 2. 用当前规则集评估 payload
//! 3. 命中 stdout 且级别不低于最低级别时，输出一行格式化日志
//! 4. 每个命中的 pipeline 独立异步触发，失败只记录警告

use crate::dispatch::{HttpPipelineDispatcher, PipelineDispatcher};
use crate::error::Result;
use crate::formatter::{JsonFormatter, LogFormatter};
use crate::level::LogLevel;
use crate::payload::{CallerInfo, LogPayload};
use crate::trace;
use chrono::Utc;
use futures::future::BoxFuture;
use nadhi_shared::config::{AppConfig, PipelineConfig};
use nadhi_shared::observability::metrics as nadhi_metrics;
use parking_lot::Mutex;
use rule_engine::{EvaluationResult, FileRuleWatcher, RuleLoader, RuleStore};
use serde_json::{Map, Value};
use std::io::Write;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// 未指定模块名时使用的默认值
pub const DEFAULT_MODULE_NAME: &str = "datanadhi_module";

/// 单条日志的规则评估结果
#[derive(Debug, Clone)]
pub struct RuleEvaluationResult {
    /// 需要触发的 pipeline（按 id 排序）
    pub pipelines: Vec<String>,
    pub stdout: bool,
    pub payload: LogPayload,
}

/// pipeline 任务的执行位置
enum Spawner {
    /// 构建 logger 时所在的 tokio 运行时
    Runtime(Handle),
    /// 不在运行时中构建时，使用自带的后台线程
    Background(mpsc::UnboundedSender<BoxFuture<'static, ()>>),
}

impl Spawner {
    fn detect() -> Self {
        match Handle::try_current() {
            Ok(handle) => Self::Runtime(handle),
            Err(_) => Self::background(),
        }
    }

    fn background() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<BoxFuture<'static, ()>>();

        let spawned = std::thread::Builder::new()
            .name("datanadhi-dispatch".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        error!(error = %e, "pipeline 分发运行时创建失败");
                        return;
                    }
                };

                runtime.block_on(async move {
                    // logger 被 drop 后 channel 关闭，线程随之退出
                    while let Some(task) = rx.recv().await {
                        tokio::spawn(task);
                    }
                });
            });

        if let Err(e) = spawned {
            error!(error = %e, "pipeline 分发线程启动失败");
        }

        Self::Background(tx)
    }

    fn spawn(&self, task: BoxFuture<'static, ()>) {
        match self {
            Self::Runtime(handle) => {
                handle.spawn(task);
            }
            Self::Background(tx) => {
                if tx.send(task).is_err() {
                    warn!("pipeline 分发线程已退出，丢弃触发任务");
                }
            }
        }
    }
}

/// 基于规则的日志记录器
pub struct DataNadhiLogger {
    module_name: String,
    min_level: LogLevel,
    store: RuleStore,
    formatter: Box<dyn LogFormatter>,
    writer: Mutex<Box<dyn Write + Send>>,
    dispatcher: Arc<dyn PipelineDispatcher>,
    spawner: Spawner,
    /// 规则热更新监听，随 logger 一起释放
    watcher: Option<FileRuleWatcher>,
}

impl DataNadhiLogger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// 按应用配置构建
    pub fn from_config(module_name: impl Into<String>, config: &AppConfig) -> Result<Self> {
        let builder = Self::builder()
            .module_name(module_name)
            .config_dir(&config.rules.config_dir)
            .pipeline_config(config.pipeline.clone());

        if config.rules.watch {
            builder
                .watch_rules(Duration::from_millis(config.rules.debounce_ms))
                .build()
        } else {
            builder.build()
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// 当前使用的规则存储，可用于热更新
    pub fn rule_store(&self) -> &RuleStore {
        &self.store
    }

    /// 是否在监听规则文件变更
    pub fn is_watching_rules(&self) -> bool {
        self.watcher.as_ref().is_some_and(FileRuleWatcher::is_running)
    }

    #[track_caller]
    pub fn debug(&self, message: &str, context: Value, trace_id: Option<&str>) {
        self.log_at(LogLevel::Debug, message, context, trace_id, self.caller(Location::caller()));
    }

    #[track_caller]
    pub fn info(&self, message: &str, context: Value, trace_id: Option<&str>) {
        self.log_at(LogLevel::Info, message, context, trace_id, self.caller(Location::caller()));
    }

    #[track_caller]
    pub fn warning(&self, message: &str, context: Value, trace_id: Option<&str>) {
        self.log_at(
            LogLevel::Warning,
            message,
            context,
            trace_id,
            self.caller(Location::caller()),
        );
    }

    #[track_caller]
    pub fn error(&self, message: &str, context: Value, trace_id: Option<&str>) {
        self.log_at(LogLevel::Error, message, context, trace_id, self.caller(Location::caller()));
    }

    #[track_caller]
    pub fn critical(&self, message: &str, context: Value, trace_id: Option<&str>) {
        self.log_at(
            LogLevel::Critical,
            message,
            context,
            trace_id,
            self.caller(Location::caller()),
        );
    }

    /// 指定级别记录日志
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: &str, context: Value, trace_id: Option<&str>) {
        self.log_at(level, message, context, trace_id, self.caller(Location::caller()));
    }

    /// 使用显式调用位置记录日志
    pub fn log_at(
        &self,
        level: LogLevel,
        message: &str,
        context: Value,
        trace_id: Option<&str>,
        caller: CallerInfo,
    ) {
        let result = self.evaluate(level, message, context, trace_id, caller);

        if result.stdout && level >= self.min_level {
            self.emit(&result.payload);
        }

        self.trigger_pipelines(&result.payload, &result.pipelines);
    }

    /// 只评估规则，不输出也不触发 pipeline
    #[track_caller]
    pub fn rule_result(
        &self,
        level: LogLevel,
        message: &str,
        context: Value,
        trace_id: Option<&str>,
    ) -> RuleEvaluationResult {
        self.evaluate(level, message, context, trace_id, self.caller(Location::caller()))
    }

    fn caller(&self, location: &Location<'_>) -> CallerInfo {
        CallerInfo::from_location(location, self.module_name.as_str())
    }

    fn evaluate(
        &self,
        level: LogLevel,
        message: &str,
        context: Value,
        trace_id: Option<&str>,
        caller: CallerInfo,
    ) -> RuleEvaluationResult {
        let payload = LogPayload {
            message: message.to_string(),
            trace_id: trace::ensure_trace_id(trace_id),
            timestamp: Utc::now(),
            level,
            caller,
            context: normalize_context(context),
        };

        let EvaluationResult {
            pipelines, stdout, ..
        } = self.store.evaluate(&payload.to_value());

        RuleEvaluationResult {
            pipelines: pipelines.into_iter().collect(),
            stdout,
            payload,
        }
    }

    fn emit(&self, payload: &LogPayload) {
        let line = self.formatter.format(payload);
        let mut writer = self.writer.lock();

        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!(error = %e, "日志输出失败");
        }
    }

    /// 每个 pipeline 单独触发，互不影响
    pub fn trigger_pipelines(&self, payload: &LogPayload, pipelines: &[String]) {
        if pipelines.is_empty() {
            return;
        }

        let log_data = Arc::new(payload.to_value());

        for pipeline_id in pipelines {
            let dispatcher = Arc::clone(&self.dispatcher);
            let log_data = Arc::clone(&log_data);
            let pipeline_id = pipeline_id.clone();

            self.spawner.spawn(Box::pin(async move {
                match dispatcher.trigger(&pipeline_id, &log_data).await {
                    Ok(_) => {
                        nadhi_metrics::record_pipeline_trigger(true);
                        debug!(pipeline_id = %pipeline_id, "pipeline 已触发");
                    }
                    Err(e) => {
                        nadhi_metrics::record_pipeline_trigger(false);
                        warn!(
                            pipeline_id = %pipeline_id,
                            code = e.code(),
                            error = %e,
                            "pipeline 触发失败"
                        );
                    }
                }
            }));
        }
    }
}

/// null 上下文按空对象处理
fn normalize_context(context: Value) -> Value {
    match context {
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}

/// DataNadhiLogger 构建器
#[derive(Default)]
pub struct LoggerBuilder {
    module_name: Option<String>,
    api_key: Option<String>,
    config_dir: Option<PathBuf>,
    min_level: Option<LogLevel>,
    pipeline_config: Option<PipelineConfig>,
    store: Option<RuleStore>,
    formatter: Option<Box<dyn LogFormatter>>,
    writer: Option<Box<dyn Write + Send>>,
    dispatcher: Option<Arc<dyn PipelineDispatcher>>,
    watch_debounce: Option<Duration>,
}

impl LoggerBuilder {
    pub fn module_name(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = Some(module_name.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// 规则配置目录，默认为当前目录下的 `.datanadhi`
    pub fn config_dir(mut self, config_dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(config_dir.into());
        self
    }

    /// 输出到 stdout 的最低级别，默认 DEBUG
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = Some(config);
        self
    }

    /// 使用已有的规则存储，不再从配置目录加载
    pub fn rule_store(mut self, store: RuleStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn formatter(mut self, formatter: impl LogFormatter + 'static) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    pub fn writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    /// 自定义 pipeline 触发器；未指定时使用 HTTP 触发器，此时必须能解析到 API Key
    pub fn dispatcher(mut self, dispatcher: Arc<dyn PipelineDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// 监听规则目录，文件变更后按 debounce 窗口自动重载
    ///
    /// 只对从配置目录加载的规则生效，通过 `rule_store` 传入的存储不监听。
    pub fn watch_rules(mut self, debounce: Duration) -> Self {
        self.watch_debounce = Some(debounce);
        self
    }

    pub fn build(self) -> Result<DataNadhiLogger> {
        let (store, loader) = match self.store {
            Some(store) => (store, None),
            None => {
                let loader = RuleLoader::resolve(self.config_dir.as_deref())?;
                (RuleStore::from_loader(&loader)?, Some(loader))
            }
        };

        let dispatcher = match self.dispatcher {
            Some(dispatcher) => dispatcher,
            None => {
                let config = self.pipeline_config.unwrap_or_default();
                let api_key = config.resolve_api_key(self.api_key.as_deref())?;
                Arc::new(HttpPipelineDispatcher::new(&config, api_key)?)
            }
        };

        let spawner = Spawner::detect();

        let watcher = match (loader, self.watch_debounce) {
            (Some(loader), Some(debounce)) => {
                let watcher = FileRuleWatcher::new(loader, store.clone(), debounce);
                if let Some(task) = watcher.watch_task()? {
                    spawner.spawn(task);
                }
                Some(watcher)
            }
            _ => None,
        };

        Ok(DataNadhiLogger {
            module_name: self
                .module_name
                .unwrap_or_else(|| DEFAULT_MODULE_NAME.to_string()),
            min_level: self.min_level.unwrap_or(LogLevel::Debug),
            store,
            formatter: self.formatter.unwrap_or_else(|| Box::new(JsonFormatter)),
            writer: Mutex::new(
                self.writer
                    .unwrap_or_else(|| Box::new(std::io::stdout())),
            ),
            dispatcher,
            spawner,
            watcher,
        })
    }
}
