//! 规则存储管理
//!
//! 使用 `ArcSwap` 持有当前生效的规则集快照：读取只需一次原子 load，
//! 热更新时整体替换，正在进行的评估始终看到一致的快照。

use crate::compiler::{CompiledRuleSet, RuleCompiler};
use crate::error::Result;
use crate::executor::RuleExecutor;
use crate::loader::RuleLoader;
use crate::models::{EvaluationResult, Rule};
use arc_swap::ArcSwap;
use nadhi_shared::observability::metrics as nadhi_metrics;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// 规则存储
#[derive(Clone)]
pub struct RuleStore {
    /// 当前规则集快照
    current: Arc<ArcSwap<CompiledRuleSet>>,
    /// 规则编译器
    compiler: Arc<Mutex<RuleCompiler>>,
    executor: RuleExecutor,
    /// 规则集版本变更通知
    tx: Arc<watch::Sender<u64>>,
}

impl RuleStore {
    /// 创建空的规则存储
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            current: Arc::new(ArcSwap::from_pointee(CompiledRuleSet::default())),
            compiler: Arc::new(Mutex::new(RuleCompiler::new())),
            executor: RuleExecutor::new(),
            tx: Arc::new(tx),
        }
    }

    /// 用给定规则创建存储
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let store = Self::new();
        store.replace(rules);
        store
    }

    /// 从配置目录加载规则创建存储
    pub fn from_loader(loader: &RuleLoader) -> Result<Self> {
        let store = Self::new();
        store.reload(loader)?;
        Ok(store)
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.executor = self.executor.with_trace();
        self
    }

    /// 替换整个规则集，返回新的编译版本号
    #[instrument(skip(self, rules), fields(rules = rules.len()))]
    pub fn replace(&self, rules: Vec<Rule>) -> u64 {
        let compiled = self.compiler.lock().compile_all(rules);
        let version = compiled.compile_version;

        self.current.store(Arc::new(compiled));
        // 没有订阅者时也要保存最新版本，供之后的 subscribe 读取
        self.tx.send_replace(version);

        info!(version, "规则集已更新");
        version
    }

    /// 从配置目录重新加载；失败时保留原有规则集
    #[instrument(skip(self, loader), fields(config_dir = %loader.config_dir().display()))]
    pub fn reload(&self, loader: &RuleLoader) -> Result<usize> {
        match loader.load() {
            Ok(rules) => {
                let count = rules.len();
                self.replace(rules);
                nadhi_metrics::record_rule_reload(true);
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "规则重新加载失败，继续使用当前规则集");
                nadhi_metrics::record_rule_reload(false);
                Err(e)
            }
        }
    }

    /// 获取当前规则集快照
    pub fn snapshot(&self) -> Arc<CompiledRuleSet> {
        self.current.load_full()
    }

    /// 用当前规则集评估一条记录
    pub fn evaluate(&self, record: &Value) -> EvaluationResult {
        let rules = self.current.load();
        self.executor.execute(record, &rules)
    }

    /// 订阅规则集版本变更
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    pub fn version(&self) -> u64 {
        self.current.load().compile_version
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// 当前所有规则名称（按规则顺序）
    pub fn rule_names(&self) -> Vec<String> {
        self.current
            .load()
            .iter()
            .map(|r| r.name().to_string())
            .collect()
    }

    /// 清空所有规则
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let count = self.len();
        self.replace(Vec::new());
        info!("已清空 {} 条规则", count);
    }

    /// 获取规则统计信息
    pub fn stats(&self) -> RuleStoreStats {
        let rules = self.current.load();
        let rules_count = rules.len();
        let total_conditions: usize = rules.iter().map(|r| r.conditions.len()).sum();
        let faulted_conditions = rules
            .iter()
            .flat_map(|r| r.conditions.iter())
            .filter(|c| c.is_faulted())
            .count();

        RuleStoreStats {
            rules_count,
            total_conditions,
            faulted_conditions,
            compile_version: rules.compile_version,
        }
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 规则存储统计信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleStoreStats {
    /// 规则总数
    pub rules_count: usize,
    /// 所有规则的条件总数
    pub total_conditions: usize,
    /// 编译阶段已确定出错的条件数
    pub faulted_conditions: usize,
    pub compile_version: u64,
}
