//! 规则加载器
//!
//! 从配置目录读取所有 `*.yaml` / `*.yml` 文件并解析出规则列表。
//! 文件按文件名排序读取，规则按文件顺序拼接。

use crate::error::{Result, RuleError};
use crate::models::Rule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// 默认配置目录（相对于当前工作目录）
pub const DEFAULT_CONFIG_DIR: &str = ".datanadhi";

/// 单个规则文件的结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfigFile {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleConfigFile {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// 规则加载器
#[derive(Debug, Clone)]
pub struct RuleLoader {
    config_dir: PathBuf,
}

impl RuleLoader {
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// 使用当前工作目录下的 `.datanadhi` 目录
    pub fn from_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|source| RuleError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Ok(Self::new(cwd.join(DEFAULT_CONFIG_DIR)))
    }

    /// 指定目录时使用该目录，否则回退到默认目录
    pub fn resolve(config_dir: Option<&Path>) -> Result<Self> {
        match config_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::from_current_dir(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// 列出目录中的规则文件（按文件名排序）
    pub fn config_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.config_dir.is_dir() {
            return Err(RuleError::ConfigDirNotFound(self.config_dir.clone()));
        }

        let entries = std::fs::read_dir(&self.config_dir).map_err(|source| RuleError::Io {
            path: self.config_dir.clone(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && Self::is_rule_file(path))
            .collect();
        paths.sort();

        Ok(paths)
    }

    /// 加载目录中的全部规则
    #[instrument(skip(self), fields(config_dir = %self.config_dir.display()))]
    pub fn load(&self) -> Result<Vec<Rule>> {
        let paths = self.config_paths()?;

        if paths.is_empty() {
            return Err(RuleError::NoConfigFound(self.config_dir.clone()));
        }

        let mut rules = Vec::new();
        for path in &paths {
            let file_rules = Self::load_file(path)?;
            debug!(path = %path.display(), count = file_rules.len(), "规则文件已解析");
            rules.extend(file_rules);
        }

        info!(files = paths.len(), rules = rules.len(), "规则加载完成");
        Ok(rules)
    }

    /// 加载单个规则文件
    pub fn load_file(path: &Path) -> Result<Vec<Rule>> {
        let content = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(RuleConfigFile::from_yaml(&content)?.rules)
    }

    pub fn is_rule_file(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        )
    }
}
