//! CLI 命令定义

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 日志规则引擎命令行工具
#[derive(Parser, Debug)]
#[command(name = "rule-engine")]
#[command(version, about = "Data Nadhi 日志规则评估工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，未指定时使用配置文件
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// 规则配置目录，未指定时使用配置文件中的 rules.config_dir
    #[arg(short, long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 对一条 JSON 记录评估规则
    Evaluate {
        /// 记录文件路径，`-` 或省略时从 stdin 读取
        #[arg(short, long)]
        record: Option<PathBuf>,

        /// 输出逐条件的评估追踪
        #[arg(long)]
        trace: bool,
    },

    /// 校验规则文件，存在错误时以非零状态退出
    Validate,

    /// 从 stdin 逐行读取 JSON 记录并输出评估结果
    Stream {
        /// 监听规则文件变更并热更新
        #[arg(short, long)]
        watch: bool,

        /// 热更新 debounce 窗口（毫秒），未指定时使用配置文件
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
}
