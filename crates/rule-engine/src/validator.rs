//! 规则校验器
//!
//! 对加载后的规则做静态检查。校验结果只是报告，不会阻止规则被加载：
//! 有问题的条件在评估时按不匹配处理。

use crate::models::Rule;
use crate::operators::ConditionKind;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// 问题级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
        }
    }
}

/// 单条校验问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<usize>,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.condition {
            Some(i) => write!(
                f,
                "[{}] {}.conditions[{}]: {}",
                self.severity, self.rule, i, self.message
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.rule, self.message),
        }
    }
}

/// 校验报告
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub rules_checked: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == IssueSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
    }
}

/// 规则校验器
pub struct RuleValidator;

impl RuleValidator {
    pub fn validate(rules: &[Rule]) -> ValidationReport {
        let mut report = ValidationReport {
            rules_checked: rules.len(),
            issues: Vec::new(),
        };
        let mut seen_names = HashSet::new();

        for rule in rules {
            Self::validate_rule(rule, &mut seen_names, &mut report.issues);
        }

        report
    }

    fn validate_rule(
        rule: &Rule,
        seen_names: &mut HashSet<String>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let mut push = |severity: IssueSeverity, condition: Option<usize>, message: String| {
            issues.push(ValidationIssue {
                severity,
                rule: rule.name.clone(),
                condition,
                message,
            })
        };

        if rule.name.trim().is_empty() {
            push(IssueSeverity::Error, None, "规则名称不能为空".to_string());
        } else if !seen_names.insert(rule.name.clone()) {
            push(IssueSeverity::Error, None, "规则名称重复".to_string());
        }

        if rule.conditions.is_empty() {
            if rule.any_condition_match {
                push(
                    IssueSeverity::Warning,
                    None,
                    "OR 规则没有条件，永远不会触发".to_string(),
                );
            } else {
                push(
                    IssueSeverity::Warning,
                    None,
                    "AND 规则没有条件，对每条记录都会触发".to_string(),
                );
            }
        }

        if rule.pipelines.is_empty() && !rule.stdout {
            push(
                IssueSeverity::Warning,
                None,
                "规则既没有 pipeline 也没有开启 stdout，触发后无任何动作".to_string(),
            );
        }

        for (i, cond) in rule.conditions.iter().enumerate() {
            if cond.key.is_empty() {
                push(IssueSeverity::Error, Some(i), "条件的 key 不能为空".to_string());
            }

            match cond.kind {
                ConditionKind::Regex => {
                    if let Err(e) = regex::Regex::new(&cond.value) {
                        push(
                            IssueSeverity::Error,
                            Some(i),
                            format!("正则表达式无效: {}", e),
                        );
                    }
                }
                ConditionKind::Unrecognized => {
                    push(
                        IssueSeverity::Error,
                        Some(i),
                        "无法识别的条件类型（应为 exact / partial / regex）".to_string(),
                    );
                }
                ConditionKind::Exact | ConditionKind::Partial => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Condition;

    #[test]
    fn test_valid_rules() {
        let rules = vec![
            Rule::new("a", vec![Condition::exact("level", "error")]).with_pipelines(["p"]),
            Rule::new("b", vec![Condition::regex("message", "^timeout")]).with_stdout(),
        ];

        let report = RuleValidator::validate(&rules);
        assert_eq!(report.rules_checked, 2);
        assert!(report.issues.is_empty());
        assert!(!report.has_errors());
    }

    #[test]
    fn test_invalid_regex() {
        let rules = vec![
            Rule::new("bad", vec![Condition::regex("message", "[invalid")]).with_pipelines(["p"]),
        ];

        let report = RuleValidator::validate(&rules);
        assert!(report.has_errors());
        let issue = report.errors().next().unwrap();
        assert_eq!(issue.condition, Some(0));
        assert!(issue.message.contains("正则表达式无效"));
    }

    #[test]
    fn test_duplicate_and_empty_names() {
        let rules = vec![
            Rule::new("dup", vec![Condition::exact("a", "b")]).with_pipelines(["p"]),
            Rule::new("dup", vec![Condition::exact("a", "b")]).with_pipelines(["p"]),
            Rule::new("", vec![Condition::exact("a", "b")]).with_pipelines(["p"]),
        ];

        let report = RuleValidator::validate(&rules);
        assert_eq!(report.errors().count(), 2);
    }

    #[test]
    fn test_empty_condition_warnings() {
        let rules = vec![
            Rule::new("always", vec![]).with_pipelines(["p"]),
            Rule::new("never", vec![]).match_any().with_pipelines(["p"]),
        ];

        let report = RuleValidator::validate(&rules);
        assert!(!report.has_errors());
        let messages: Vec<String> = report.warnings().map(|i| i.message.clone()).collect();
        assert!(messages.iter().any(|m| m.contains("都会触发")));
        assert!(messages.iter().any(|m| m.contains("永远不会触发")));
    }

    #[test]
    fn test_rule_without_actions() {
        let rules = vec![Rule::new("noop", vec![Condition::exact("a", "b")])];
        let report = RuleValidator::validate(&rules);
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_unrecognized_kind_and_empty_key() {
        let rules = vec![
            Rule::new(
                "r",
                vec![
                    Condition::new("a", ConditionKind::Unrecognized, "x"),
                    Condition::exact("", "x"),
                ],
            )
            .with_pipelines(["p"]),
        ];

        let report = RuleValidator::validate(&rules);
        assert_eq!(report.errors().count(), 2);
        assert_eq!(
            report.issues[1].to_string(),
            "[ERROR] r.conditions[1]: 条件的 key 不能为空"
        );
    }
}
