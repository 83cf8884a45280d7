//! 错误处理模块
//!
//! 定义了命令录制核心中使用的统一错误类型，使用 `thiserror` 提供友好的错误消息。
//!
//! # 设计原则
//!
//! - 使用 `thiserror` 自动实现 `Error` trait
//! - 为每种错误类型提供清晰的上下文信息
//! - 底层 Vulkan 的 `vk::Result` 可以直接通过 `?` 转换
//! - 易于模式匹配和错误处理

use ash::vk;
use thiserror::Error;

/// 统一的 Result 类型
///
/// 所有可能返回错误的函数都应该使用这个类型。
pub type Result<T> = std::result::Result<T, RhiError>;

/// RHI 核心的错误类型
#[derive(Debug, Error)]
pub enum RhiError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 图形 API 错误
    #[error("Graphics error: {0}")]
    Graphics(#[from] GraphicsError),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 日志系统错误
    #[error("Log error: {0}")]
    Log(String),
}

/// 配置相关的错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件未找到
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    /// 配置文件解析失败
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// 配置值无效
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug, Error)]
pub enum GraphicsError {
    /// 资源创建失败（池、布局、渲染通道、帧缓冲、管线、查询池）
    #[error("Resource creation failed: {0}")]
    ResourceCreation(String),

    /// 渲染命令执行失败
    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    /// 同步原语操作失败
    #[error("Synchronization failed: {0}")]
    Sync(String),

    /// 在不允许的状态下调用了录制操作
    #[error("'{operation}' is not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    /// 等待超时
    #[error("Timed out after {0} ns")]
    Timeout(u64),

    /// 未分类的 Vulkan 错误
    #[error("Vulkan call failed: {0}")]
    Vulkan(vk::Result),
}

impl From<vk::Result> for RhiError {
    fn from(err: vk::Result) -> Self {
        RhiError::Graphics(GraphicsError::Vulkan(err))
    }
}

impl RhiError {
    /// 构造资源创建失败错误
    pub fn creation(what: &str, err: vk::Result) -> Self {
        GraphicsError::ResourceCreation(format!("{}: {:?}", what, err)).into()
    }

    /// 是否为状态前置条件错误
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, RhiError::Graphics(GraphicsError::InvalidState { .. }))
    }
}
