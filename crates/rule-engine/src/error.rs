//! 规则引擎错误类型
//!
//! 只有配置边界（加载、解析、监听）会返回这些错误，评估路径本身从不失败。

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("配置目录不存在或不是目录: {0}")]
    ConfigDirNotFound(PathBuf),

    #[error("配置目录中没有规则文件: {0}")]
    NoConfigFound(PathBuf),

    #[error("读取规则文件失败: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML 解析失败: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("无效的条件类型: {0}")]
    InvalidConditionKind(String),

    #[error("文件监听失败: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
