//! CLI 模块
//!
//! - `evaluate` - 对单条记录评估规则，输出评估结果 JSON
//! - `validate` - 静态检查规则文件
//! - `stream` - 逐行读取 JSON 记录并评估，可选监听规则变更
//!
//! # 使用示例
//!
//! ```bash
//! rule-engine --config-dir .datanadhi evaluate --record record.json
//! echo '{"level":"error"}' | rule-engine evaluate --trace
//! rule-engine validate
//! tail -f app.log | rule-engine stream --watch
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
