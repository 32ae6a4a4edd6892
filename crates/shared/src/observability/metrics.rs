//! 指标模块
//!
//! 基于 metrics facade 记录规则评估与 pipeline 触发相关的计数器。
//! 未安装 recorder 时所有记录均为空操作。

/// 评估次数
pub const EVALUATIONS_TOTAL: &str = "nadhi_evaluations_total";
/// 触发的规则数
pub const RULES_FIRED_TOTAL: &str = "nadhi_rules_fired_total";
/// 评估中出错的条件数
pub const CONDITION_FAULTS_TOTAL: &str = "nadhi_condition_faults_total";
/// pipeline 触发次数（按 status 区分）
pub const PIPELINE_TRIGGERS_TOTAL: &str = "nadhi_pipeline_triggers_total";
/// 规则重载次数（按 status 区分）
pub const RULE_RELOADS_TOTAL: &str = "nadhi_rule_reloads_total";

/// 注册指标描述
pub fn describe() {
    metrics::describe_counter!(EVALUATIONS_TOTAL, "Total number of record evaluations");
    metrics::describe_counter!(RULES_FIRED_TOTAL, "Total number of rules fired");
    metrics::describe_counter!(
        CONDITION_FAULTS_TOTAL,
        "Total number of faulted conditions during evaluation"
    );
    metrics::describe_counter!(
        PIPELINE_TRIGGERS_TOTAL,
        "Total number of pipeline trigger requests"
    );
    metrics::describe_counter!(RULE_RELOADS_TOTAL, "Total number of rule set reloads");
}

fn status_label(success: bool) -> &'static str {
    if success { "success" } else { "failure" }
}

/// 记录一次评估
#[inline]
pub fn record_evaluation(rules_fired: usize, faulted_conditions: usize) {
    metrics::counter!(EVALUATIONS_TOTAL).increment(1);

    if rules_fired > 0 {
        metrics::counter!(RULES_FIRED_TOTAL).increment(rules_fired as u64);
    }
    if faulted_conditions > 0 {
        metrics::counter!(CONDITION_FAULTS_TOTAL).increment(faulted_conditions as u64);
    }
}

/// 记录规则重载
#[inline]
pub fn record_rule_reload(success: bool) {
    metrics::counter!(RULE_RELOADS_TOTAL, "status" => status_label(success)).increment(1);
}

/// 记录 pipeline 触发
#[inline]
pub fn record_pipeline_trigger(success: bool) {
    metrics::counter!(PIPELINE_TRIGGERS_TOTAL, "status" => status_label(success)).increment(1);
}
