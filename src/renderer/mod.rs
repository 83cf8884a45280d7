//! 命令录制核心
//!
//! 与 DX12 的对象模型对应：
//!
//! - `command`：`CommandAllocator` / `CommandBuffer`，队列类型
//! - `command_list`：`CommandList` 状态机，所有录制操作的入口
//! - `state`：资源状态到 Vulkan 访问掩码与布局的转换
//! - `sync`：Fence / Semaphore 管理与逐命令缓冲的同步
//! - `descriptor`：按绑定类别管理的描述符
//! - `render_pass`：由渲染目标合成渲染通道
//! - `pipeline`：着色器阶段与计算管线
//! - `query`：时间戳、遮挡与管线统计查询
//! - `resource`：外部资源与视图的描述

pub mod command;
pub mod command_list;
pub mod descriptor;
pub mod pipeline;
pub mod query;
pub mod render_pass;
pub mod resource;
pub mod state;
pub mod sync;

// 重新导出常用类型
pub use command::{CommandAllocator, CommandBuffer, QueueType};
pub use command_list::{CommandList, CommandListState};
pub use descriptor::{BindingCategory, DescriptorPoolStats};
pub use pipeline::{PipelineKind, ShaderStage};
pub use query::{OcclusionQuery, PipelineStatistics, PipelineStatisticsQuery, TimestampQuery};
pub use render_pass::RenderTargetSet;
pub use resource::{
    BufferResource, ClearFlags, ConstantBufferView, DepthStencilView, ImageDimension,
    ImageResource, IndexBufferView, IndexFormat, RenderTargetView, Resource, ResourceState,
    ShaderResourceView, UnorderedAccessView, VertexBufferView,
};
pub use state::{ResourceBarrier, ResourceStateConverter};
pub use sync::{CommandBufferSync, FenceStatus, SyncManager};
