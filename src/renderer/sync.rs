//! GPU 同步机制模块
//!
//! 提供 CPU-GPU 与 GPU-GPU 的同步原语。
//!
//! # 设计原则
//!
//! - **Fence 同步**：用于 CPU 等待 GPU 完成工作
//! - **Semaphore 同步**：用于队列提交之间的排序
//! - **集中所有权**：所有 Fence / Semaphore 由 `SyncManager` 创建和销毁，
//!   `CommandBufferSync` 只借用它们
//!
//! # 使用场景
//!
//! 1. **帧同步**：`CommandBufferSync::begin` 等待上一次提交完成后才重新录制
//! 2. **多队列协作**：提交时 signal semaphore，下一次提交等待它

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ash::vk;
use tracing::{debug, error, warn};

use crate::core::config::SyncConfig;
use crate::core::error::{GraphicsError, Result, RhiError};
use crate::gfx::DeviceApi;

use super::command::CommandBuffer;

/// Fence 状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    /// 尚未 signal（等待超时）
    NotSignaled,
    /// 已经 signal
    Signaled,
}

impl FenceStatus {
    pub fn is_signaled(&self) -> bool {
        matches!(self, FenceStatus::Signaled)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 同步对象管理器
///
/// 一个设备一个。创建的每个 Fence / Semaphore 都登记在这里，
/// 管理器销毁时强制销毁所有仍然登记的对象（调用方需保证 GPU 已经空闲）。
pub struct SyncManager {
    device: Arc<dyn DeviceApi>,
    fences: Mutex<HashSet<vk::Fence>>,
    semaphores: Mutex<HashSet<vk::Semaphore>>,
}

impl SyncManager {
    /// 创建同步管理器
    pub fn new(device: Arc<dyn DeviceApi>) -> Self {
        Self {
            device,
            fences: Mutex::new(HashSet::new()),
            semaphores: Mutex::new(HashSet::new()),
        }
    }

    /// 获取底层设备
    pub fn device(&self) -> &Arc<dyn DeviceApi> {
        &self.device
    }

    /// 创建 Fence
    ///
    /// # 参数
    ///
    /// * `signaled` - 是否以已 signal 状态创建
    ///
    /// # 返回值
    ///
    /// 成功时返回登记过的 Fence；失败时记录错误日志并返回 `Err`
    pub fn create_fence(&self, signaled: bool) -> Result<vk::Fence> {
        let fence = self.device.create_fence(signaled).map_err(|e| {
            error!(signaled, error = ?e, "Failed to create fence");
            RhiError::creation("fence", e)
        })?;
        lock(&self.fences).insert(fence);
        debug!(?fence, signaled, "Fence created");
        Ok(fence)
    }

    /// 创建 Semaphore
    pub fn create_semaphore(&self) -> Result<vk::Semaphore> {
        let semaphore = self.device.create_semaphore().map_err(|e| {
            error!(error = ?e, "Failed to create semaphore");
            RhiError::creation("semaphore", e)
        })?;
        lock(&self.semaphores).insert(semaphore);
        debug!(?semaphore, "Semaphore created");
        Ok(semaphore)
    }

    /// 阻塞等待 Fence
    ///
    /// # 参数
    ///
    /// * `fence` - 要等待的 Fence，空句柄直接视为已 signal
    /// * `timeout_ns` - 超时时间（纳秒），0 表示只查询不等待
    ///
    /// # 返回值
    ///
    /// 超时返回 `NotSignaled`。不会重置 Fence。
    pub fn wait_for_fence(&self, fence: vk::Fence, timeout_ns: u64) -> Result<FenceStatus> {
        if fence == vk::Fence::null() {
            return Ok(FenceStatus::Signaled);
        }

        match self.device.wait_for_fence(fence, timeout_ns) {
            Ok(()) => Ok(FenceStatus::Signaled),
            Err(vk::Result::TIMEOUT) => Ok(FenceStatus::NotSignaled),
            Err(e) => {
                error!(?fence, error = ?e, "Failed to wait for fence");
                Err(GraphicsError::Sync(format!("Failed to wait for fence: {:?}", e)).into())
            }
        }
    }

    /// 非阻塞查询 Fence 状态
    pub fn fence_status(&self, fence: vk::Fence) -> Result<FenceStatus> {
        if fence == vk::Fence::null() {
            return Ok(FenceStatus::Signaled);
        }

        match self.device.fence_status(fence) {
            Ok(true) => Ok(FenceStatus::Signaled),
            Ok(false) => Ok(FenceStatus::NotSignaled),
            Err(e) => {
                error!(?fence, error = ?e, "Failed to query fence status");
                Err(GraphicsError::Sync(format!("Failed to query fence: {:?}", e)).into())
            }
        }
    }

    /// 重置 Fence 为未 signal 状态
    pub fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        if fence == vk::Fence::null() {
            return Ok(());
        }

        self.device.reset_fence(fence).map_err(|e| {
            error!(?fence, error = ?e, "Failed to reset fence");
            GraphicsError::Sync(format!("Failed to reset fence: {:?}", e)).into()
        })
    }

    /// 销毁 Fence，不属于本管理器的句柄会被忽略
    pub fn destroy_fence(&self, fence: vk::Fence) {
        if lock(&self.fences).remove(&fence) {
            self.device.destroy_fence(fence);
        } else if fence != vk::Fence::null() {
            warn!(?fence, "Ignoring destroy of a fence not owned by this manager");
        }
    }

    /// 销毁 Semaphore，不属于本管理器的句柄会被忽略
    pub fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        if lock(&self.semaphores).remove(&semaphore) {
            self.device.destroy_semaphore(semaphore);
        } else if semaphore != vk::Semaphore::null() {
            warn!(?semaphore, "Ignoring destroy of a semaphore not owned by this manager");
        }
    }

    /// 等待设备空闲
    pub fn wait_idle(&self) -> Result<()> {
        self.device.wait_idle().map_err(|e| {
            error!(error = ?e, "Failed to wait for device idle");
            GraphicsError::Sync(format!("Failed to wait for device idle: {:?}", e)).into()
        })
    }

    /// 当前登记的 Fence 数量
    pub fn fence_count(&self) -> usize {
        lock(&self.fences).len()
    }

    /// 当前登记的 Semaphore 数量
    pub fn semaphore_count(&self) -> usize {
        lock(&self.semaphores).len()
    }
}

impl Drop for SyncManager {
    fn drop(&mut self) {
        let fences: Vec<_> = lock(&self.fences).drain().collect();
        let semaphores: Vec<_> = lock(&self.semaphores).drain().collect();
        if !fences.is_empty() || !semaphores.is_empty() {
            debug!(
                fences = fences.len(),
                semaphores = semaphores.len(),
                "Destroying remaining sync objects"
            );
        }
        for fence in fences {
            self.device.destroy_fence(fence);
        }
        for semaphore in semaphores {
            self.device.destroy_semaphore(semaphore);
        }
    }
}

/// 单个命令缓冲的提交同步
///
/// 一对 Fence + Semaphore：Fence 以已 signal 状态创建，第一次 `begin` 不会阻塞；
/// 每次提交都 signal 两者。
pub struct CommandBufferSync {
    manager: Arc<SyncManager>,
    fence: vk::Fence,
    semaphore: vk::Semaphore,
    timeout_ns: u64,
}

impl CommandBufferSync {
    /// 创建同步对，等待超时为无限
    pub fn new(manager: Arc<SyncManager>) -> Result<Self> {
        Self::with_timeout(manager, u64::MAX)
    }

    /// 按配置创建同步对
    pub fn from_config(manager: Arc<SyncManager>, config: &SyncConfig) -> Result<Self> {
        Self::with_timeout(manager, config.fence_timeout())
    }

    /// 创建同步对并指定 `begin` / `wait_for_completion` 的等待超时
    pub fn with_timeout(manager: Arc<SyncManager>, timeout_ns: u64) -> Result<Self> {
        let fence = manager.create_fence(true)?;
        let semaphore = match manager.create_semaphore() {
            Ok(semaphore) => semaphore,
            Err(e) => {
                manager.destroy_fence(fence);
                return Err(e);
            }
        };

        Ok(Self {
            manager,
            fence,
            semaphore,
            timeout_ns,
        })
    }

    /// 提交完成时 signal 的 Fence
    pub fn fence(&self) -> vk::Fence {
        self.fence
    }

    /// 提交完成时 signal 的 Semaphore
    pub fn semaphore(&self) -> vk::Semaphore {
        self.semaphore
    }

    /// 准备重新录制
    ///
    /// 等待上一次提交完成后重置 Fence。超时返回错误，Fence 保持原样。
    pub fn begin(&self) -> Result<()> {
        self.wait_for_completion()?;
        self.manager.reset_fence(self.fence)
    }

    /// 提交命令缓冲
    pub fn submit(&self, command_buffer: &CommandBuffer, queue: vk::Queue) -> Result<()> {
        self.submit_with_wait(command_buffer, queue, &[])
    }

    /// 提交命令缓冲，并在执行前等待给定的 Semaphore
    pub fn submit_with_wait(
        &self,
        command_buffer: &CommandBuffer,
        queue: vk::Queue,
        wait: &[(vk::Semaphore, vk::PipelineStageFlags)],
    ) -> Result<()> {
        self.manager
            .device()
            .queue_submit(
                queue,
                command_buffer.handle(),
                wait,
                &[self.semaphore],
                self.fence,
            )
            .map_err(|e| {
                error!(queue = %command_buffer.queue_type(), error = ?e, "Queue submit failed");
                GraphicsError::CommandExecution(format!("Queue submit failed: {:?}", e)).into()
            })
    }

    /// 阻塞直到上一次提交完成
    pub fn wait_for_completion(&self) -> Result<()> {
        match self.manager.wait_for_fence(self.fence, self.timeout_ns)? {
            FenceStatus::Signaled => Ok(()),
            FenceStatus::NotSignaled => {
                warn!(fence = ?self.fence, timeout_ns = self.timeout_ns, "Timed out waiting for submission");
                Err(GraphicsError::Timeout(self.timeout_ns).into())
            }
        }
    }
}

impl Drop for CommandBufferSync {
    fn drop(&mut self) {
        self.manager.destroy_fence(self.fence);
        self.manager.destroy_semaphore(self.semaphore);
    }
}
