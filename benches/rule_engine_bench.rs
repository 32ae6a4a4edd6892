//! 规则引擎性能基准测试
//!
//! 测试覆盖：
//! - AND / OR 规则在不同条件数下的评估性能
//! - 短路求值带来的差异
//! - 规则编译性能
//! - 不同规则集规模下的整体评估性能

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rule_engine::{Condition, Rule, RuleCompiler, RuleExecutor, RuleStore};
use serde_json::{Value, json};
use std::hint::black_box;

/// 创建 AND 规则：field_i == value_i
fn create_and_rule(conditions_count: usize) -> Rule {
    let conditions = (0..conditions_count)
        .map(|i| Condition::exact(format!("fields.field_{}", i), format!("value_{}", i)))
        .collect();

    Rule::new("and_rule", conditions).with_pipelines(["and"])
}

/// 创建 OR 规则：只有最后一个条件能匹配
fn create_or_rule(conditions_count: usize) -> Rule {
    let conditions = (0..conditions_count)
        .map(|i| {
            let expected = if i + 1 == conditions_count {
                format!("value_{}", i)
            } else {
                "never".to_string()
            };
            Condition::exact(format!("fields.field_{}", i), expected)
        })
        .collect();

    Rule::new("or_rule", conditions)
        .match_any()
        .with_pipelines(["or"])
}

/// 创建混合规则集
fn create_rule_set(rules_count: usize) -> Vec<Rule> {
    (0..rules_count)
        .map(|i| match i % 3 {
            0 => Rule::new(
                format!("exact_{}", i),
                vec![Condition::exact("log_record.level", "ERROR")],
            )
            .with_stdout()
            .with_pipelines([format!("alerts_{}", i % 5)]),
            1 => Rule::new(
                format!("partial_{}", i),
                vec![
                    Condition::partial("context.user.id", "4"),
                    Condition::partial("message", "payment"),
                ],
            )
            .with_pipelines([format!("users_{}", i % 7)]),
            _ => Rule::new(
                format!("regex_{}", i),
                vec![
                    Condition::regex("message", "^timeout after \\d+s"),
                    Condition::exact("log_record.module_name", "billing"),
                ],
            )
            .match_any()
            .with_pipelines([format!("timeouts_{}", i % 3)]),
        })
        .collect()
}

fn create_record(field_count: usize) -> Value {
    let fields: serde_json::Map<String, Value> = (0..field_count)
        .map(|i| (format!("field_{}", i), json!(format!("value_{}", i))))
        .collect();

    json!({
        "message": "timeout after 30s while calling payment gateway",
        "trace_id": "3f1c9a2e-7b7d-4c1e-9a51-0c2f8f7f6d10",
        "timestamp": "2026-01-01T00:00:00.000000Z",
        "log_record": {
            "filename": "billing.rs",
            "function_name": "charge",
            "level": "ERROR",
            "line_number": 120,
            "module_name": "billing"
        },
        "context": {"user": {"id": "42"}},
        "fields": fields
    })
}

/// AND 规则：全部匹配
fn bench_and_conditions(c: &mut Criterion) {
    let mut group = c.benchmark_group("and_conditions");
    let executor = RuleExecutor::new();

    for conditions_count in [1, 5, 10, 50] {
        let rules = RuleCompiler::new().compile_all(vec![create_and_rule(conditions_count)]);
        let record = create_record(conditions_count);

        group.throughput(Throughput::Elements(conditions_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(conditions_count),
            &record,
            |b, record| b.iter(|| executor.execute(black_box(record), black_box(&rules))),
        );
    }

    group.finish();
}

/// OR 规则：最后一个条件才匹配
fn bench_or_conditions(c: &mut Criterion) {
    let mut group = c.benchmark_group("or_conditions");
    let executor = RuleExecutor::new();

    for conditions_count in [1, 5, 10, 50] {
        let rules = RuleCompiler::new().compile_all(vec![create_or_rule(conditions_count)]);
        let record = create_record(conditions_count);

        group.throughput(Throughput::Elements(conditions_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(conditions_count),
            &record,
            |b, record| b.iter(|| executor.execute(black_box(record), black_box(&rules))),
        );
    }

    group.finish();
}

/// 短路求值
fn bench_short_circuit(c: &mut Criterion) {
    let mut group = c.benchmark_group("short_circuit");
    let executor = RuleExecutor::new();

    let rules = RuleCompiler::new().compile_all(vec![create_and_rule(50)]);
    let matching = create_record(50);
    let non_matching = json!({"fields": {"field_0": "other"}});

    group.bench_function("and_all_match", |b| {
        b.iter(|| executor.execute(black_box(&matching), black_box(&rules)))
    });

    group.bench_function("and_first_fails", |b| {
        b.iter(|| executor.execute(black_box(&non_matching), black_box(&rules)))
    });

    group.finish();
}

/// 规则编译
fn bench_rule_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_compilation");

    for rules_count in [10, 100] {
        let rules = create_rule_set(rules_count);
        group.bench_with_input(
            BenchmarkId::from_parameter(rules_count),
            &rules,
            |b, rules| b.iter(|| RuleCompiler::new().compile_all(black_box(rules.clone()))),
        );
    }

    group.finish();
}

/// 整体评估：不同规则集规模
fn bench_rule_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_store_evaluate");
    let record = create_record(0);

    for rules_count in [1, 10, 100, 1000] {
        let store = RuleStore::from_rules(create_rule_set(rules_count));

        group.throughput(Throughput::Elements(rules_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(rules_count),
            &record,
            |b, record| b.iter(|| store.evaluate(black_box(record))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_and_conditions,
    bench_or_conditions,
    bench_short_circuit,
    bench_rule_compilation,
    bench_rule_store
);
criterion_main!(benches);
