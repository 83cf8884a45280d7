//! 配置管理模块
//!
//! 提供命令录制核心配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也可以直接通过代码构建。
//!
//! # 配置文件格式 (rhi.toml)
//!
//! ```toml
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//!
//! [command_list]
//! framebuffer_width = 800
//! framebuffer_height = 600
//! strict_state_checks = true
//!
//! [descriptors]
//! max_sets = 1024
//! descriptors_per_pool = 1024
//!
//! [sync]
//! fence_timeout_ns = 1000000000  # 省略表示无限等待
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};

/// 核心配置
///
/// 包含了命令列表、描述符池和同步相关的所有配置项。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,

    /// 命令列表配置
    #[serde(default)]
    pub command_list: CommandListConfig,

    /// 描述符池配置
    #[serde(default)]
    pub descriptors: DescriptorConfig,

    /// 同步配置
    #[serde(default)]
    pub sync: SyncConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// 命令列表配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandListConfig {
    /// 帧缓冲默认宽度（未显式指定尺寸时使用）
    #[serde(default = "default_framebuffer_width")]
    pub framebuffer_width: u32,

    /// 帧缓冲默认高度
    #[serde(default = "default_framebuffer_height")]
    pub framebuffer_height: u32,

    /// 在非录制状态下调用录制操作时是否返回错误
    ///
    /// 关闭时只记录警告并忽略该调用。调试构建默认开启。
    #[serde(default = "default_strict_state_checks")]
    pub strict_state_checks: bool,
}

/// 描述符池配置
///
/// 每个绑定类别各自拥有一个按此配置创建的池。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorConfig {
    /// 每个池最多可分配的描述符集数量
    #[serde(default = "default_max_sets")]
    pub max_sets: u32,

    /// 每个池的描述符数量
    #[serde(default = "default_descriptors_per_pool")]
    pub descriptors_per_pool: u32,
}

/// 同步配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// 重用命令缓冲前等待 Fence 的超时时间（纳秒）
    ///
    /// `None` 表示无限等待。TOML 整数是 i64，无法直接写出 `u64::MAX`。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fence_timeout_ns: Option<u64>,
}

impl SyncConfig {
    /// 实际传给 `vkWaitForFences` 的超时
    pub fn fence_timeout(&self) -> u64 {
        self.fence_timeout_ns.unwrap_or(u64::MAX)
    }
}

// 默认值函数
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "dist_rhi.log".to_string() }
fn default_framebuffer_width() -> u32 { 800 }
fn default_framebuffer_height() -> u32 { 600 }
fn default_strict_state_checks() -> bool { cfg!(debug_assertions) }
fn default_max_sets() -> u32 { 1024 }
fn default_descriptors_per_pool() -> u32 { 1024 }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Default for CommandListConfig {
    fn default() -> Self {
        Self {
            framebuffer_width: default_framebuffer_width(),
            framebuffer_height: default_framebuffer_height(),
            strict_state_checks: default_strict_state_checks(),
        }
    }
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            max_sets: default_max_sets(),
            descriptors_per_pool: default_descriptors_per_pool(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fence_timeout_ns: None,
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    ///
    /// 成功返回 `Config` 实例，失败返回错误
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.command_list.framebuffer_width == 0 || self.command_list.framebuffer_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "command_list.framebuffer_width/height".to_string(),
                reason: "Framebuffer dimensions must be greater than 0".to_string(),
            }
            .into());
        }

        if self.descriptors.max_sets == 0 {
            return Err(ConfigError::InvalidValue {
                field: "descriptors.max_sets".to_string(),
                reason: "A descriptor pool must allow at least one set".to_string(),
            }
            .into());
        }

        if self.descriptors.descriptors_per_pool < self.descriptors.max_sets {
            return Err(ConfigError::InvalidValue {
                field: "descriptors.descriptors_per_pool".to_string(),
                reason: "Every set holds one descriptor, so the pool needs at least max_sets descriptors"
                    .to_string(),
            }
            .into());
        }

        if self.sync.fence_timeout_ns.map_or(false, |ns| ns > i64::MAX as u64) {
            return Err(ConfigError::InvalidValue {
                field: "sync.fence_timeout_ns".to_string(),
                reason: "Finite timeouts must fit in a TOML integer; omit the field to wait forever"
                    .to_string(),
            }
            .into());
        }

        Ok(())
    }
}
