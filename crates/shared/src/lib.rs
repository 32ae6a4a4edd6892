//! 共享库
//!
//! Data Nadhi 各组件共用的配置加载、错误类型与可观测性初始化。

pub mod config;
pub mod error;
pub mod observability;

pub use error::{NadhiError, Result};
