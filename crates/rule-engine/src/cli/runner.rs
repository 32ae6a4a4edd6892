//! 命令执行器
//!
//! 将命令行参数转化为规则加载、评估与校验调用。输出统一写入传入的 writer，便于测试。

use std::io::{Read as _, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::loader::RuleLoader;
use crate::store::RuleStore;
use crate::validator::RuleValidator;
use crate::watcher::{FileRuleWatcher, RuleWatcher};

/// 命令执行器
pub struct CommandRunner {
    loader: RuleLoader,
}

impl CommandRunner {
    pub fn new(loader: RuleLoader) -> Self {
        Self { loader }
    }

    /// 执行 evaluate 命令
    pub fn run_evaluate<W: Write>(
        &self,
        record: Option<&Path>,
        trace: bool,
        out: &mut W,
    ) -> Result<()> {
        let record = read_record(record)?;

        let mut store = RuleStore::from_loader(&self.loader)
            .with_context(|| format!("加载规则失败: {}", self.loader.config_dir().display()))?;
        if trace {
            store = store.with_trace();
        }

        let result = store.evaluate(&record);
        info!(
            matched = result.matched_rules.len(),
            pipelines = result.pipelines.len(),
            stdout = result.stdout,
            "评估完成"
        );

        serde_json::to_writer_pretty(&mut *out, &result)?;
        writeln!(out)?;
        Ok(())
    }

    /// 执行 validate 命令，返回是否通过（无错误）
    pub fn run_validate<W: Write>(&self, out: &mut W) -> Result<bool> {
        let rules = self
            .loader
            .load()
            .with_context(|| format!("加载规则失败: {}", self.loader.config_dir().display()))?;

        let report = RuleValidator::validate(&rules);
        for issue in &report.issues {
            writeln!(out, "{}", issue)?;
        }

        writeln!(
            out,
            "检查 {} 条规则: {} 个错误, {} 个警告",
            report.rules_checked,
            report.errors().count(),
            report.warnings().count()
        )?;

        Ok(!report.has_errors())
    }

    /// 执行 stream 命令，返回成功评估的记录数
    ///
    /// 每行一条 JSON 记录；无法解析的行记录警告后跳过。
    pub async fn run_stream<R, W>(
        &self,
        input: R,
        out: &mut W,
        watch: Option<Duration>,
    ) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let store = RuleStore::from_loader(&self.loader)
            .with_context(|| format!("加载规则失败: {}", self.loader.config_dir().display()))?;

        let watcher = match watch {
            Some(debounce) => {
                let watcher = FileRuleWatcher::new(self.loader.clone(), store.clone(), debounce);
                watcher.start().await?;
                Some(watcher)
            }
            None => None,
        };

        let mut count = 0;
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let record: Value = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "跳过无法解析的记录");
                    continue;
                }
            };

            serde_json::to_writer(&mut *out, &store.evaluate(&record))?;
            writeln!(out)?;
            count += 1;
        }

        if let Some(watcher) = watcher {
            watcher.stop().await?;
        }

        info!(records = count, "输入结束");
        Ok(count)
    }
}

/// 读取记录：路径为 `-` 或未指定时读取 stdin
fn read_record(path: Option<&Path>) -> Result<Value> {
    let content = match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("读取记录文件失败: {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("从 stdin 读取记录失败")?;
            buf
        }
    };

    serde_json::from_str(&content).context("记录不是合法的 JSON")
}
