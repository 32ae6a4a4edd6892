//! 条件类型定义

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 条件类型
///
/// 配置文件中的 `type` 字段在加载时解析为该枚举；
/// 无法识别的取值落入 `Unrecognized`，评估时永远不匹配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// 严格相等
    Exact,
    /// 子串包含
    Partial,
    /// 从字符串开头匹配的正则
    Regex,
    #[serde(other)]
    Unrecognized,
}

impl ConditionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Partial => "partial",
            Self::Regex => "regex",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// 宽松解析，未知取值映射为 `Unrecognized`
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Self::Unrecognized)
    }
}

impl FromStr for ConditionKind {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "partial" => Ok(Self::Partial),
            "regex" => Ok(Self::Regex),
            other => Err(RuleError::InvalidConditionKind(other.to_string())),
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
