//! 规则执行器
//!
//! 实现规则级 AND / OR 短路求值，以及跨规则的 pipeline 合并和 stdout 标志聚合。

use crate::compiler::{CompiledRule, CompiledRuleSet, RuleCompiler};
use crate::evaluator::{ConditionEvaluator, ConditionOutcome};
use crate::models::{EvaluationResult, Rule};
use crate::resolver;
use nadhi_shared::observability::metrics as nadhi_metrics;
use serde_json::Value;

/// 规则执行器
#[derive(Debug, Clone, Default)]
pub struct RuleExecutor {
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 对整个规则集评估一条记录
    ///
    /// 永不失败：出错的条件只影响自身，按不匹配处理。
    pub fn execute(&self, record: &Value, rules: &CompiledRuleSet) -> EvaluationResult {
        let mut result = EvaluationResult::empty();

        if rules.is_empty() {
            return result;
        }

        for rule in rules.iter() {
            if !self.rule_fires(record, rule, &mut result) {
                continue;
            }

            result.pipelines.extend(rule.pipelines().iter().cloned());
            // stdout 标志单调：任一触发规则要求回显即为 true
            if rule.stdout() {
                result.stdout = true;
            }
            result.matched_rules.push(rule.name().to_string());
        }

        nadhi_metrics::record_evaluation(result.matched_rules.len(), result.faulted_conditions);

        result
    }

    /// 判断单条规则是否触发
    ///
    /// - OR（`any_condition_match = true`）：遇到第一个匹配即触发；无条件时永不触发
    /// - AND（`any_condition_match = false`）：遇到第一个不匹配即放弃；无条件时恒触发
    pub fn rule_fires(
        &self,
        record: &Value,
        rule: &CompiledRule,
        result: &mut EvaluationResult,
    ) -> bool {
        let match_any = rule.match_any();

        for (i, cond) in rule.conditions.iter().enumerate() {
            let field_value =
                resolver::resolve_segments(record, cond.segments.iter().map(String::as_str));
            let outcome = ConditionEvaluator::evaluate(field_value, &cond.matcher);

            if let ConditionOutcome::Faulted(reason) = &outcome {
                result.faulted_conditions += 1;
                if self.trace_enabled {
                    result.evaluation_trace.push(format!(
                        "{}.conditions[{}]: {} 出错 ({}) => NOT_MATCHED",
                        rule.name(),
                        i,
                        cond.key,
                        reason
                    ));
                }
            } else if self.trace_enabled {
                result.evaluation_trace.push(format!(
                    "{}.conditions[{}]: {} {} => {}",
                    rule.name(),
                    i,
                    cond.key,
                    cond.kind,
                    if outcome.is_match() { "MATCHED" } else { "NOT_MATCHED" }
                ));
            }

            match (match_any, outcome.is_match()) {
                (true, true) => {
                    self.trace(result, || format!("{}: OR 短路 - 条件 {} 匹配", rule.name(), i));
                    return true;
                }
                (false, false) => {
                    self.trace(result, || {
                        format!("{}: AND 短路 - 条件 {} 不匹配", rule.name(), i)
                    });
                    return false;
                }
                _ => {}
            }
        }

        // OR 走到这里说明没有任何条件匹配；AND 说明全部匹配（含空条件）
        let fired = !match_any;
        self.trace(result, || {
            if fired {
                format!("{}: AND 组全部匹配", rule.name())
            } else {
                format!("{}: OR 组无匹配", rule.name())
            }
        });
        fired
    }

    fn trace<F>(&self, result: &mut EvaluationResult, message: F)
    where
        F: FnOnce() -> String,
    {
        if self.trace_enabled {
            result.evaluation_trace.push(message());
        }
    }
}

/// 对编译后的规则集评估一条记录
pub fn evaluate(record: &Value, rules: &CompiledRuleSet) -> EvaluationResult {
    RuleExecutor::new().execute(record, rules)
}

/// 对未编译的规则列表评估一条记录
///
/// 规则列表为空或未提供时返回空结果。
pub fn evaluate_rules(record: &Value, rules: Option<&[Rule]>) -> EvaluationResult {
    match rules {
        Some(rules) if !rules.is_empty() => {
            let compiled = RuleCompiler::new().compile_all(rules.to_vec());
            evaluate(record, &compiled)
        }
        _ => EvaluationResult::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Condition;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn compile(rules: Vec<Rule>) -> CompiledRuleSet {
        RuleCompiler::new().compile_all(rules)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample_record() -> Value {
        json!({
            "level": "error",
            "message": "timeout after 30s",
            "context": {"user": {"id": "42"}}
        })
    }

    #[test]
    fn test_empty_rules() {
        let result = evaluate(&sample_record(), &CompiledRuleSet::default());
        assert!(result.pipelines.is_empty());
        assert!(!result.stdout);

        assert_eq!(evaluate_rules(&sample_record(), None), EvaluationResult::empty());
        assert_eq!(evaluate_rules(&sample_record(), Some(&[])), EvaluationResult::empty());
    }

    #[test]
    fn test_and_rule_all_match() {
        let rules = compile(vec![
            Rule::new(
                "and",
                vec![
                    Condition::exact("level", "error"),
                    Condition::partial("context.user.id", "4"),
                ],
            )
            .with_pipelines(["p1"]),
        ]);

        let result = evaluate(&sample_record(), &rules);
        assert_eq!(result.pipelines, set(&["p1"]));
        assert_eq!(result.matched_rules, vec!["and".to_string()]);
    }

    #[test]
    fn test_and_rule_short_circuit() {
        let rules = compile(vec![
            Rule::new(
                "and",
                vec![
                    Condition::exact("level", "info"),
                    Condition::regex("message", "[invalid"),
                ],
            )
            .with_pipelines(["p1"]),
        ]);

        let executor = RuleExecutor::new().with_trace();
        let result = executor.execute(&sample_record(), &rules);

        assert!(result.pipelines.is_empty());
        // 第一个条件不匹配，第二个（出错的）条件不会被评估
        assert_eq!(result.faulted_conditions, 0);
        assert!(result.evaluation_trace.iter().any(|t| t.contains("AND 短路")));
    }

    #[test]
    fn test_or_rule_first_match() {
        let rules = compile(vec![
            Rule::new(
                "or",
                vec![
                    Condition::exact("level", "error"),
                    Condition::regex("message", "[invalid"),
                ],
            )
            .match_any()
            .with_pipelines(["p3"]),
        ]);

        let executor = RuleExecutor::new().with_trace();
        let result = executor.execute(&sample_record(), &rules);

        assert_eq!(result.pipelines, set(&["p3"]));
        assert_eq!(result.faulted_conditions, 0);
        assert!(result.evaluation_trace.iter().any(|t| t.contains("OR 短路")));
    }

    #[test]
    fn test_or_rule_no_match() {
        let rules = compile(vec![
            Rule::new(
                "or",
                vec![Condition::exact("level", "info"), Condition::exact("missing", "x")],
            )
            .match_any()
            .with_pipelines(["p"]),
        ]);

        assert!(evaluate(&sample_record(), &rules).is_empty());
    }

    #[test]
    fn test_empty_and_rule_fires_vacuously() {
        let rules = compile(vec![Rule::new("always", vec![]).with_pipelines(["p"])]);
        let result = evaluate(&json!({}), &rules);
        assert_eq!(result.pipelines, set(&["p"]));
    }

    #[test]
    fn test_empty_or_rule_never_fires() {
        let rules = compile(vec![
            Rule::new("never", vec![]).match_any().with_stdout().with_pipelines(["p"]),
        ]);
        let result = evaluate(&sample_record(), &rules);
        assert!(result.is_empty());
    }

    #[test]
    fn test_pipeline_union_is_deduplicated() {
        let rules = compile(vec![
            Rule::new("a", vec![Condition::exact("level", "error")]).with_pipelines(["p1"]),
            Rule::new("b", vec![Condition::partial("message", "timeout")])
                .with_pipelines(["p1", "p2"]),
        ]);

        let result = evaluate(&sample_record(), &rules);
        assert_eq!(result.pipelines, set(&["p1", "p2"]));
        assert_eq!(result.pipeline_list(), vec!["p1", "p2"]);
    }

    #[test]
    fn test_stdout_flag_is_monotonic() {
        let with_stdout =
            Rule::new("loud", vec![Condition::exact("level", "error")]).with_stdout();
        let quiet = Rule::new("quiet", vec![Condition::exact("level", "error")]);

        let forward =
            evaluate(&sample_record(), &compile(vec![with_stdout.clone(), quiet.clone()]));
        let backward = evaluate(&sample_record(), &compile(vec![quiet, with_stdout]));

        assert!(forward.stdout);
        assert!(backward.stdout);
        assert_eq!(forward.pipelines, backward.pipelines);
    }

    #[test]
    fn test_non_firing_rule_does_not_set_stdout() {
        let rules = compile(vec![
            Rule::new("loud", vec![Condition::exact("level", "debug")]).with_stdout(),
        ]);
        assert!(!evaluate(&sample_record(), &rules).stdout);
    }

    #[test]
    fn test_faulted_condition_is_isolated() {
        let rules = compile(vec![
            Rule::new(
                "bad-or",
                vec![
                    Condition::regex("message", "(unclosed"),
                    Condition::exact("level", "error"),
                ],
            )
            .match_any()
            .with_pipelines(["recovered"]),
            Rule::new("bad-and", vec![Condition::regex("message", "(unclosed")])
                .with_pipelines(["never"]),
            Rule::new("good", vec![Condition::exact("level", "error")])
                .with_pipelines(["good"]),
        ]);

        let result = evaluate(&sample_record(), &rules);

        assert_eq!(result.pipelines, set(&["good", "recovered"]));
        assert_eq!(result.faulted_conditions, 2);
    }

    #[test]
    fn test_absent_field_never_matches() {
        let rules = compile(vec![
            Rule::new("absent", vec![Condition::regex("b.c", ".*")]).with_pipelines(["p"]),
        ]);
        assert!(evaluate(&json!({"a": 1}), &rules).is_empty());
    }

    #[test]
    fn test_trace_disabled_by_default() {
        let rules = compile(vec![Rule::new("r", vec![Condition::exact("level", "error")])]);
        let result = evaluate(&sample_record(), &rules);
        assert!(result.evaluation_trace.is_empty());
    }

    #[test]
    fn test_evaluate_uncompiled_rules() {
        let rules = vec![
            Rule::new("r", vec![Condition::regex("message", "^timeout")])
                .match_any()
                .with_pipelines(["p3"]),
        ];
        let result = evaluate_rules(&sample_record(), Some(&rules));
        assert_eq!(result.pipelines, set(&["p3"]));
        assert!(!result.stdout);
    }
}
