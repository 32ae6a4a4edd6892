//! 规则编译器
//!
//! 将配置中的规则预处理为可直接执行的形式：切分字段路径、预编译正则，
//! 并把无法识别的条件类型和无效正则隔离到单个条件上。编译本身永不失败。

use crate::models::{Condition, Rule};
use crate::operators::ConditionKind;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// 条件匹配器
#[derive(Debug, Clone)]
pub enum Matcher {
    Exact(String),
    Partial(String),
    Regex(Regex),
    /// 正则编译失败，评估时按出错处理
    Invalid { reason: String },
    /// 未知条件类型，永不匹配
    Unrecognized,
}

/// 编译后的条件
#[derive(Debug, Clone)]
pub struct CompiledCondition {
    pub key: String,
    pub segments: Vec<String>,
    pub kind: ConditionKind,
    pub matcher: Matcher,
}

impl CompiledCondition {
    /// 条件是否在编译阶段就已确定出错
    pub fn is_faulted(&self) -> bool {
        matches!(self.matcher, Matcher::Invalid { .. })
    }
}

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// 原始规则
    pub rule: Rule,
    pub conditions: Vec<CompiledCondition>,
    /// 规则中使用的所有字段路径
    pub required_fields: HashSet<String>,
}

impl CompiledRule {
    pub fn name(&self) -> &str {
        &self.rule.name
    }

    pub fn match_any(&self) -> bool {
        self.rule.any_condition_match
    }

    pub fn stdout(&self) -> bool {
        self.rule.stdout
    }

    pub fn pipelines(&self) -> &[String] {
        &self.rule.pipelines
    }
}

/// 编译后的规则集
///
/// 不可变，可通过 `Arc` 在多个线程间共享评估。
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    rules: Arc<Vec<CompiledRule>>,
    /// 编译版本号（用于判断热更新是否生效）
    pub compile_version: u64,
}

impl CompiledRuleSet {
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }
}

/// 规则编译器
pub struct RuleCompiler {
    compile_version: u64,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self { compile_version: 0 }
    }

    /// 编译单条规则
    pub fn compile(&self, rule: Rule) -> CompiledRule {
        let conditions: Vec<CompiledCondition> = rule
            .conditions
            .iter()
            .map(|cond| Self::compile_condition(&rule.name, cond))
            .collect();

        let required_fields = rule.conditions.iter().map(|c| c.key.clone()).collect();

        CompiledRule {
            rule,
            conditions,
            required_fields,
        }
    }

    /// 编译整个规则集，保持规则顺序
    pub fn compile_all(&mut self, rules: Vec<Rule>) -> CompiledRuleSet {
        let compiled = rules.into_iter().map(|rule| self.compile(rule)).collect();
        self.compile_version += 1;

        CompiledRuleSet {
            rules: Arc::new(compiled),
            compile_version: self.compile_version,
        }
    }

    fn compile_condition(rule_name: &str, cond: &Condition) -> CompiledCondition {
        let matcher = match cond.kind {
            ConditionKind::Exact => Matcher::Exact(cond.value.clone()),
            ConditionKind::Partial => Matcher::Partial(cond.value.clone()),
            ConditionKind::Regex => match Regex::new(&cond.value) {
                Ok(regex) => Matcher::Regex(regex),
                Err(e) => {
                    warn!(
                        rule = %rule_name,
                        key = %cond.key,
                        pattern = %cond.value,
                        error = %e,
                        "无效的正则表达式，该条件将按不匹配处理"
                    );
                    Matcher::Invalid {
                        reason: format!("无效的正则表达式 '{}': {}", cond.value, e),
                    }
                }
            },
            ConditionKind::Unrecognized => {
                warn!(
                    rule = %rule_name,
                    key = %cond.key,
                    "无法识别的条件类型，该条件永不匹配"
                );
                Matcher::Unrecognized
            }
        };

        CompiledCondition {
            key: cond.key.clone(),
            segments: cond.key.split('.').map(str::to_string).collect(),
            kind: cond.kind,
            matcher,
        }
    }
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new()
    }
}
