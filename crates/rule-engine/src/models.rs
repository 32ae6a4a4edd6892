//! 规则引擎领域模型

use crate::operators::ConditionKind;
use crate::resolver;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// 规则定义
///
/// 字段名与 YAML 配置保持一致：`any_condition_match` / `stdout` / `pipelines`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// true 为任一条件命中即触发（OR），false 为全部命中才触发（AND）
    #[serde(default)]
    pub any_condition_match: bool,
    /// 命中后是否回显到 stdout
    #[serde(default)]
    pub stdout: bool,
    #[serde(default)]
    pub pipelines: Vec<String>,
}

impl Rule {
    pub fn new(name: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            name: name.into(),
            conditions,
            any_condition_match: false,
            stdout: false,
            pipelines: Vec::new(),
        }
    }

    pub fn match_any(mut self) -> Self {
        self.any_condition_match = true;
        self
    }

    pub fn with_stdout(mut self) -> Self {
        self.stdout = true;
        self
    }

    pub fn with_pipelines<I, S>(mut self, pipelines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pipelines = pipelines.into_iter().map(Into::into).collect();
        self
    }
}

/// 条件节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// 点号分隔的字段路径，如 `context.user.id`
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    #[serde(deserialize_with = "deserialize_operand")]
    pub value: String,
}

impl Condition {
    pub fn new(key: impl Into<String>, kind: ConditionKind, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            value: value.into(),
        }
    }

    pub fn exact(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, ConditionKind::Exact, value)
    }

    pub fn partial(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, ConditionKind::Partial, value)
    }

    pub fn regex(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, ConditionKind::Regex, value)
    }
}

/// YAML 中 `value: 42` 或 `value: true` 这类标量统一转成字符串，布尔值与记录值的字符串形式一致
fn deserialize_operand<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(true) => Ok("True".to_string()),
        Value::Bool(false) => Ok("False".to_string()),
        other => Err(serde::de::Error::custom(format!(
            "条件值必须是标量，实际为 {}",
            other
        ))),
    }
}

/// 待评估的日志记录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    data: Value,
}

impl Record {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// 从 JSON 字符串创建
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let data: Value = serde_json::from_str(json)?;
        Ok(Self { data })
    }

    /// 获取字段值（点号路径）
    pub fn get_field(&self, path: &str) -> Option<&Value> {
        resolver::resolve(&self.data, path)
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_inner(self) -> Value {
        self.data
    }
}

impl From<Value> for Record {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

/// 评估结果
///
/// pipeline 以集合形式合并，按标识符排序输出。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub pipelines: BTreeSet<String>,
    pub stdout: bool,
    /// 触发的规则名称（按规则顺序）
    pub matched_rules: Vec<String>,
    /// 评估过程中出错而按不匹配处理的条件数
    pub faulted_conditions: usize,
    /// 评估追踪（仅在执行器开启追踪时记录）
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evaluation_trace: Vec<String>,
}

impl EvaluationResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty() && !self.stdout
    }

    pub fn pipeline_list(&self) -> Vec<String> {
        self.pipelines.iter().cloned().collect()
    }
}
