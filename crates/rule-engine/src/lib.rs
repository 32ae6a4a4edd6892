//! 日志规则引擎
//!
//! 对结构化日志记录评估一组声明式规则，输出需要触发的 pipeline 集合以及是否回显到 stdout：
//! - 点号路径解析（`context.user.id`）
//! - exact / partial / regex 三种条件匹配
//! - 规则级 AND / OR 短路聚合，跨规则集合并
//! - YAML 规则加载、校验与热更新

pub mod cli;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod loader;
pub mod models;
pub mod operators;
pub mod resolver;
pub mod store;
pub mod validator;
pub mod watcher;

pub use compiler::{CompiledCondition, CompiledRule, CompiledRuleSet, Matcher, RuleCompiler};
pub use error::{Result, RuleError};
pub use evaluator::{ConditionEvaluator, ConditionOutcome};
pub use executor::{RuleExecutor, evaluate, evaluate_rules};
pub use loader::{DEFAULT_CONFIG_DIR, RuleConfigFile, RuleLoader};
pub use models::{Condition, EvaluationResult, Record, Rule};
pub use operators::ConditionKind;
pub use resolver::{resolve, resolve_segments};
pub use store::{RuleStore, RuleStoreStats};
pub use validator::{IssueSeverity, RuleValidator, ValidationIssue, ValidationReport};
pub use watcher::{FileRuleWatcher, RuleWatcher, WatchTask};
