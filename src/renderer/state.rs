//! 资源状态转换
//!
//! 把 `ResourceState` 映射为 Vulkan 的访问掩码与图像布局，并据此构造内存屏障。
//! 映射是一张固定的表，不会失败。

use ash::vk;

use super::resource::{Resource, ResourceState};

/// 屏障两侧使用的管线阶段
///
/// 所有转换都在 ALL_COMMANDS 上同步，正确但偏保守。
pub const BARRIER_STAGE: vk::PipelineStageFlags = vk::PipelineStageFlags::ALL_COMMANDS;

/// 某个状态对应的访问掩码与布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateAccess {
    pub access: vk::AccessFlags,
    pub layout: vk::ImageLayout,
}

/// 单个资源的屏障
#[derive(Debug, Clone, Copy)]
pub enum ResourceBarrier {
    Buffer(vk::BufferMemoryBarrier),
    Image(vk::ImageMemoryBarrier),
}

/// 资源状态转换器
pub struct ResourceStateConverter;

impl ResourceStateConverter {
    /// 状态 → (访问掩码, 布局)
    ///
    /// 缓冲会忽略布局。
    pub fn convert(state: ResourceState) -> StateAccess {
        let (access, layout) = match state {
            ResourceState::Undefined => (vk::AccessFlags::empty(), vk::ImageLayout::UNDEFINED),
            ResourceState::Common => (
                vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE,
                vk::ImageLayout::GENERAL,
            ),
            ResourceState::VertexBuffer => (
                vk::AccessFlags::VERTEX_ATTRIBUTE_READ,
                vk::ImageLayout::GENERAL,
            ),
            ResourceState::ConstantBuffer => {
                (vk::AccessFlags::UNIFORM_READ, vk::ImageLayout::GENERAL)
            }
            ResourceState::IndexBuffer => (vk::AccessFlags::INDEX_READ, vk::ImageLayout::GENERAL),
            ResourceState::RenderTarget => (
                vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ),
            ResourceState::UnorderedAccess => (
                vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
                vk::ImageLayout::GENERAL,
            ),
            ResourceState::DepthWrite => (
                vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            ),
            ResourceState::DepthRead => (
                vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
                vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
            ),
            ResourceState::ShaderResource => (
                vk::AccessFlags::SHADER_READ,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            ),
            ResourceState::CopyDest => (
                vk::AccessFlags::TRANSFER_WRITE,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            ),
            ResourceState::CopySource => (
                vk::AccessFlags::TRANSFER_READ,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            ),
            ResourceState::Present => (vk::AccessFlags::MEMORY_READ, vk::ImageLayout::PRESENT_SRC_KHR),
        };

        StateAccess { access, layout }
    }

    /// 为一次状态转换构造屏障
    ///
    /// 图像屏障覆盖所有 mip 和数组层，aspect 由格式推导；
    /// 缓冲屏障覆盖整个缓冲。不做队列族转移。
    pub fn build_barrier(
        resource: &Resource,
        before: ResourceState,
        after: ResourceState,
    ) -> ResourceBarrier {
        let src = Self::convert(before);
        let dst = Self::convert(after);

        match resource {
            Resource::Buffer(buffer) => ResourceBarrier::Buffer(
                vk::BufferMemoryBarrier::builder()
                    .src_access_mask(src.access)
                    .dst_access_mask(dst.access)
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .buffer(buffer.handle)
                    .offset(0)
                    .size(vk::WHOLE_SIZE)
                    .build(),
            ),
            Resource::Image(image) => ResourceBarrier::Image(
                vk::ImageMemoryBarrier::builder()
                    .src_access_mask(src.access)
                    .dst_access_mask(dst.access)
                    .old_layout(src.layout)
                    .new_layout(dst.layout)
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(image.handle)
                    .subresource_range(image.full_range())
                    .build(),
            ),
        }
    }
}
