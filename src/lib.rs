//! DistRHI - 命令录制与同步核心
//!
//! 在 Vulkan 之上提供 DX12 风格的命令录制接口：
//! 命令分配器、命令列表状态机、资源状态转换、同步原语和 GPU 查询。
//! 设备、队列和资源由外部创建，本库只负责录制、提交与同步。
//!
//! # 模块结构
//!
//! - `core`: 配置、日志和错误处理
//! - `gfx`: 逻辑设备接口 `DeviceApi` 及其 ash 实现
//! - `renderer`: 命令录制核心
//!
//! # 使用示例
//!
//! ```no_run
//! use std::sync::Arc;
//! use dist_rhi::core::Config;
//! use dist_rhi::gfx::DeviceApi;
//! use dist_rhi::renderer::{CommandAllocator, CommandList, CommandListState, QueueType};
//!
//! fn record(device: Arc<dyn DeviceApi>) -> dist_rhi::core::Result<()> {
//!     let config = Config::default();
//!     let allocator = Arc::new(CommandAllocator::new(device.clone(), QueueType::Graphics));
//!     let mut list = CommandList::new(device, QueueType::Graphics, &config);
//!
//!     list.reset_with_allocator(&allocator)?;
//!     list.draw(3, 0)?;
//!     list.close()?;
//!     assert_eq!(list.state(), CommandListState::Closed);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod gfx;
pub mod renderer;
