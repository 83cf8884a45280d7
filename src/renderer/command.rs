//! 命令分配器与命令缓冲模块
//!
//! 对应 DX12 的 CommandAllocator 与 Vulkan 的 CommandPool / CommandBuffer。
//!
//! # 设计原则
//!
//! - **一个队列类型一个池**：`CommandAllocator` 只为一种队列类型服务
//! - **薄封装**：`CommandBuffer` 只负责 begin / end / reset，录制逻辑在 `CommandList` 中
//! - **生命周期**：命令缓冲持有分配器的 `Arc`，保证池在所有缓冲释放后才销毁

use std::fmt;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, warn};

use crate::core::error::{GraphicsError, Result, RhiError};
use crate::gfx::DeviceApi;

/// 命令队列类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueType {
    /// 图形队列（支持图形、计算、传输）
    Graphics,
    /// 计算队列（支持计算、传输）
    Compute,
    /// 传输队列（仅支持复制）
    Copy,
}

impl QueueType {
    /// 该队列是否可以执行渲染通道和绘制命令
    pub fn supports_graphics(&self) -> bool {
        matches!(self, QueueType::Graphics)
    }

    /// 该队列是否可以执行计算派发
    pub fn supports_compute(&self) -> bool {
        matches!(self, QueueType::Graphics | QueueType::Compute)
    }

    /// 获取队列类型名称
    pub fn name(&self) -> &'static str {
        match self {
            QueueType::Graphics => "Graphics",
            QueueType::Compute => "Compute",
            QueueType::Copy => "Copy",
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 命令分配器
///
/// 为一种队列类型持有一个命令池。池创建失败时分配器处于不可用状态
/// （空句柄），之后的所有分配都会失败。
pub struct CommandAllocator {
    device: Arc<dyn DeviceApi>,
    queue_type: QueueType,
    pool: vk::CommandPool,
}

impl CommandAllocator {
    /// 为指定队列类型创建命令分配器
    ///
    /// 创建失败只记录日志，返回的分配器不可用（`is_valid()` 为 false）。
    pub fn new(device: Arc<dyn DeviceApi>, queue_type: QueueType) -> Self {
        let family_index = device.queue(queue_type).family_index;
        let pool = match device.create_command_pool(family_index) {
            Ok(pool) => {
                debug!(queue = %queue_type, family_index, "Command pool created");
                pool
            }
            Err(e) => {
                error!(queue = %queue_type, family_index, error = ?e, "Failed to create command pool");
                vk::CommandPool::null()
            }
        };

        Self {
            device,
            queue_type,
            pool,
        }
    }

    /// 获取队列类型
    pub fn queue_type(&self) -> QueueType {
        self.queue_type
    }

    /// 池是否创建成功
    pub fn is_valid(&self) -> bool {
        self.pool != vk::CommandPool::null()
    }

    /// 获取命令池句柄
    pub fn handle(&self) -> vk::CommandPool {
        self.pool
    }

    /// 重置分配器
    ///
    /// 把所有从该池分配的命令缓冲回收到初始状态，不释放池内存。
    /// 调用方必须保证这些缓冲都不在 GPU 上执行。
    pub fn reset(&self) -> Result<()> {
        if !self.is_valid() {
            warn!(queue = %self.queue_type, "Reset on an invalid command allocator ignored");
            return Ok(());
        }

        self.device.reset_command_pool(self.pool).map_err(|e| {
            error!(queue = %self.queue_type, error = ?e, "Failed to reset command pool");
            RhiError::from(GraphicsError::CommandExecution(format!(
                "Failed to reset command pool: {:?}",
                e
            )))
        })
    }

    /// 从池中分配一个主命令缓冲
    pub fn allocate(self: &Arc<Self>) -> Result<CommandBuffer> {
        if !self.is_valid() {
            error!(queue = %self.queue_type, "Cannot allocate from an invalid command allocator");
            return Err(GraphicsError::ResourceCreation(
                "Command allocator has no pool".to_string(),
            )
            .into());
        }

        let handle = self.device.allocate_command_buffer(self.pool).map_err(|e| {
            error!(queue = %self.queue_type, error = ?e, "Failed to allocate command buffer");
            RhiError::creation("command buffer", e)
        })?;

        Ok(CommandBuffer {
            allocator: Arc::clone(self),
            handle,
            recording: false,
        })
    }
}

impl Drop for CommandAllocator {
    fn drop(&mut self) {
        if self.is_valid() {
            self.device.destroy_command_pool(self.pool);
        }
    }
}

/// 命令缓冲
///
/// 一个已分配的录制目标。drop 时归还给所属的池。
pub struct CommandBuffer {
    allocator: Arc<CommandAllocator>,
    handle: vk::CommandBuffer,
    recording: bool,
}

impl CommandBuffer {
    /// 获取命令缓冲句柄
    pub fn handle(&self) -> vk::CommandBuffer {
        self.handle
    }

    /// 所属的分配器
    pub fn allocator(&self) -> &Arc<CommandAllocator> {
        &self.allocator
    }

    /// 所属队列类型
    pub fn queue_type(&self) -> QueueType {
        self.allocator.queue_type
    }

    /// 是否正在录制
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// 开始录制（一次性提交）
    ///
    /// 池带有 RESET_COMMAND_BUFFER 标志，begin 会隐式重置之前的内容。
    pub fn begin(&mut self) -> Result<()> {
        self.allocator
            .device
            .begin_command_buffer(self.handle)
            .map_err(|e| {
                error!(error = ?e, "Failed to begin command buffer");
                RhiError::from(GraphicsError::CommandExecution(format!(
                    "Failed to begin command buffer: {:?}",
                    e
                )))
            })?;
        self.recording = true;
        Ok(())
    }

    /// 结束录制
    pub fn end(&mut self) -> Result<()> {
        self.recording = false;
        self.allocator
            .device
            .end_command_buffer(self.handle)
            .map_err(|e| {
                error!(error = ?e, "Failed to end command buffer");
                GraphicsError::CommandExecution(format!("Failed to end command buffer: {:?}", e))
                    .into()
            })
    }

    /// 重置到初始状态
    pub fn reset(&mut self) -> Result<()> {
        self.recording = false;
        self.allocator
            .device
            .reset_command_buffer(self.handle)
            .map_err(|e| {
                error!(error = ?e, "Failed to reset command buffer");
                GraphicsError::CommandExecution(format!("Failed to reset command buffer: {:?}", e))
                    .into()
            })
    }
}

impl Drop for CommandBuffer {
    fn drop(&mut self) {
        self.allocator
            .device
            .free_command_buffer(self.allocator.pool, self.handle);
    }
}
