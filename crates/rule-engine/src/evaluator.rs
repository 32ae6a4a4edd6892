//! 条件评估器
//!
//! 对单个字段值应用 exact / partial / regex 匹配语义。

use crate::compiler::Matcher;
use crate::models::Condition;
use crate::operators::ConditionKind;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

/// 单个条件的评估结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOutcome {
    Matched,
    NotMatched,
    /// 条件本身有问题（如正则无效），按不匹配处理
    Faulted(String),
}

impl ConditionOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched)
    }

    fn from_bool(matched: bool) -> Self {
        if matched {
            Self::Matched
        } else {
            Self::NotMatched
        }
    }
}

/// 条件评估器
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 评估条件
    ///
    /// # Arguments
    /// * `field_value` - 从记录中解析出的字段值，`None` 表示不存在
    /// * `matcher` - 编译后的匹配器
    pub fn evaluate(field_value: Option<&Value>, matcher: &Matcher) -> ConditionOutcome {
        // 字段不存在时任何类型的条件都不匹配
        let Some(value) = field_value else {
            return ConditionOutcome::NotMatched;
        };

        match matcher {
            Matcher::Exact(expected) => ConditionOutcome::from_bool(Self::exact(value, expected)),
            Matcher::Partial(substr) => {
                ConditionOutcome::from_bool(Self::as_text(value).contains(substr.as_str()))
            }
            Matcher::Regex(regex) => ConditionOutcome::from_bool(Self::regex_match(value, regex)),
            Matcher::Invalid { reason } => ConditionOutcome::Faulted(reason.clone()),
            Matcher::Unrecognized => ConditionOutcome::NotMatched,
        }
    }

    /// 未编译条件的便捷匹配入口，正则每次调用都会重新编译
    pub fn matches(field_value: Option<&Value>, condition: &Condition) -> bool {
        let matcher = match condition.kind {
            ConditionKind::Exact => Matcher::Exact(condition.value.clone()),
            ConditionKind::Partial => Matcher::Partial(condition.value.clone()),
            ConditionKind::Regex => match Regex::new(&condition.value) {
                Ok(regex) => Matcher::Regex(regex),
                Err(_) => return false,
            },
            ConditionKind::Unrecognized => return false,
        };

        Self::evaluate(field_value, &matcher).is_match()
    }

    /// 严格相等：只有字符串值才可能等于字符串操作数，不做类型转换
    fn exact(value: &Value, expected: &str) -> bool {
        matches!(value, Value::String(s) if s == expected)
    }

    /// 从字符串开头匹配
    fn regex_match(value: &Value, regex: &Regex) -> bool {
        // leftmost-first 语义下，若存在起点为 0 的匹配，find 返回的就是它
        regex
            .find(&Self::as_text(value))
            .is_some_and(|m| m.start() == 0)
    }

    /// 值的字符串形式：字符串原样，布尔值为 `True` / `False`，其余使用紧凑 JSON 文本
    pub fn as_text(value: &Value) -> Cow<'_, str> {
        match value {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            Value::Bool(true) => Cow::Borrowed("True"),
            Value::Bool(false) => Cow::Borrowed("False"),
            other => Cow::Owned(other.to_string()),
        }
    }
}
