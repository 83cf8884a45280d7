//! 核心功能模块
//!
//! 与具体设备无关的基础设施：
//!
//! - `config`：TOML 配置加载
//! - `log`：基于 tracing 的日志订阅器
//! - `error`：统一的错误类型

pub mod config;
pub mod error;
pub mod log;

// 重新导出常用类型
pub use config::Config;
pub use error::{Result, RhiError};
