//! 图形设备模块
//!
//! 命令录制核心通过 `DeviceApi` trait 访问逻辑设备：
//! - `backend`：trait 定义及相关描述类型
//! - `vulkan`：基于 ash 的实现

pub mod backend;
pub mod vulkan;

#[cfg(test)]
pub(crate) mod recording;

pub use backend::{DescriptorWrite, DeviceApi, DeviceQueue, RenderPassLayout};
pub use vulkan::{AshDevice, DeviceQueues};
