//! Vulkan 实现

pub mod device;

pub use device::{AshDevice, DeviceQueues};
