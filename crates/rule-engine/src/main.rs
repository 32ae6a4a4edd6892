//! Rule Engine CLI
//!
//! 加载规则配置目录并对日志记录进行评估。

use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use nadhi_shared::config::AppConfig;
use nadhi_shared::observability;
use rule_engine::RuleLoader;
use rule_engine::cli::{Cli, CommandRunner, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load("rule-engine")?;
    // 命令行参数优先于配置文件，RUST_LOG 仍优先于两者
    if let Some(level) = cli.log_level.clone() {
        config.observability.log_level = level;
    }
    observability::init(&config.service_name, &config.observability)?;

    let config_dir = cli
        .config_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.rules.config_dir));
    let runner = CommandRunner::new(RuleLoader::new(config_dir));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Evaluate { record, trace } => {
            runner.run_evaluate(record.as_deref(), trace, &mut out)?;
        }
        Commands::Validate => {
            if !runner.run_validate(&mut out)? {
                out.flush()?;
                std::process::exit(1);
            }
        }
        Commands::Stream { watch, debounce_ms } => {
            // 命令行 --watch 或配置 rules.watch 任一开启即监听
            let debounce = (watch || config.rules.watch).then(|| {
                Duration::from_millis(debounce_ms.unwrap_or(config.rules.debounce_ms))
            });
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            runner.run_stream(input, &mut out, debounce).await?;
        }
    }

    Ok(())
}
