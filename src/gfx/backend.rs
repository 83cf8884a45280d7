//! 逻辑设备的统一抽象接口
//!
//! 命令录制核心只通过 `DeviceApi` 访问逻辑设备，不直接调用 Vulkan 函数。
//! 这样核心可以在没有 GPU 的环境下测试，也可以接入外部创建好的设备。
//!
//! 句柄类型直接使用 `ash::vk` 中的定义：它们只是 64 位整数，
//! 可以自由复制和比较，真正的生命周期由调用方（SyncManager、CommandList 等）管理。

use std::ffi::CStr;

use ash::prelude::VkResult;
use ash::vk;

use crate::renderer::command::QueueType;

/// 某类队列对应的队列族与队列句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceQueue {
    /// 队列族索引
    pub family_index: u32,
    /// 队列句柄
    pub queue: vk::Queue,
    /// 时间戳有效位数（`VkQueueFamilyProperties::timestampValidBits`），0 表示不支持时间戳
    pub timestamp_valid_bits: u32,
}

/// 渲染通道的完整描述
///
/// 只包含一个子通道：所有颜色附件加上可选的深度附件。
#[derive(Debug, Clone)]
pub struct RenderPassLayout {
    /// 附件描述，颜色附件在前，深度附件（如果有）在最后
    pub attachments: Vec<vk::AttachmentDescription>,
    /// 子通道引用的颜色附件
    pub color_refs: Vec<vk::AttachmentReference>,
    /// 子通道引用的深度附件
    pub depth_ref: Option<vk::AttachmentReference>,
    /// 外部到子通道 0 的依赖
    pub dependency: vk::SubpassDependency,
}

/// 单个描述符的写入内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorWrite {
    /// Uniform buffer 区间
    UniformBuffer {
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        range: vk::DeviceSize,
    },
    /// 采样图像（着色器只读）
    SampledImage {
        view: vk::ImageView,
        layout: vk::ImageLayout,
    },
    /// 存储图像（着色器读写）
    StorageImage {
        view: vk::ImageView,
        layout: vk::ImageLayout,
    },
}

impl DescriptorWrite {
    /// 对应的 Vulkan 描述符类型
    pub fn descriptor_type(&self) -> vk::DescriptorType {
        match self {
            DescriptorWrite::UniformBuffer { .. } => vk::DescriptorType::UNIFORM_BUFFER,
            DescriptorWrite::SampledImage { .. } => vk::DescriptorType::SAMPLED_IMAGE,
            DescriptorWrite::StorageImage { .. } => vk::DescriptorType::STORAGE_IMAGE,
        }
    }
}

/// 逻辑设备接口
///
/// 对应一个逻辑设备上命令录制核心需要的全部入口。
/// 实现者需要保证传入的句柄来自同一个设备；对象的外部同步
/// （例如同一个命令池不能被并发使用）由调用方负责。
pub trait DeviceApi: Send + Sync {
    // ---- 设备信息 ----

    /// 获取某类队列的队列族和队列句柄
    fn queue(&self, queue_type: QueueType) -> DeviceQueue;

    /// 时间戳每个计数对应的纳秒数
    fn timestamp_period(&self) -> f32;

    /// 是否支持调试标签（VK_EXT_debug_utils）
    fn supports_debug_labels(&self) -> bool;

    // ---- 同步原语 ----

    fn create_fence(&self, signaled: bool) -> VkResult<vk::Fence>;
    fn destroy_fence(&self, fence: vk::Fence);
    fn create_semaphore(&self) -> VkResult<vk::Semaphore>;
    fn destroy_semaphore(&self, semaphore: vk::Semaphore);

    /// 阻塞等待 Fence，超时返回 `Err(vk::Result::TIMEOUT)`
    fn wait_for_fence(&self, fence: vk::Fence, timeout_ns: u64) -> VkResult<()>;
    fn reset_fence(&self, fence: vk::Fence) -> VkResult<()>;

    /// 非阻塞查询 Fence 是否已 signal
    fn fence_status(&self, fence: vk::Fence) -> VkResult<bool>;

    /// 等待设备上的所有工作完成
    fn wait_idle(&self) -> VkResult<()>;

    /// 提交一个命令缓冲
    fn queue_submit(
        &self,
        queue: vk::Queue,
        command_buffer: vk::CommandBuffer,
        wait: &[(vk::Semaphore, vk::PipelineStageFlags)],
        signal: &[vk::Semaphore],
        fence: vk::Fence,
    ) -> VkResult<()>;

    // ---- 命令池与命令缓冲 ----

    fn create_command_pool(&self, queue_family_index: u32) -> VkResult<vk::CommandPool>;
    fn reset_command_pool(&self, pool: vk::CommandPool) -> VkResult<()>;
    fn destroy_command_pool(&self, pool: vk::CommandPool);
    fn allocate_command_buffer(&self, pool: vk::CommandPool) -> VkResult<vk::CommandBuffer>;
    fn free_command_buffer(&self, pool: vk::CommandPool, command_buffer: vk::CommandBuffer);
    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()>;
    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()>;
    fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()>;

    // ---- 渲染通道与帧缓冲 ----

    fn create_render_pass(&self, layout: &RenderPassLayout) -> VkResult<vk::RenderPass>;
    fn destroy_render_pass(&self, render_pass: vk::RenderPass);
    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VkResult<vk::Framebuffer>;
    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);

    // ---- 描述符 ----

    /// 创建只有一个绑定点（binding 0）的描述符集布局
    fn create_descriptor_set_layout(
        &self,
        descriptor_type: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
    ) -> VkResult<vk::DescriptorSetLayout>;
    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout);
    fn create_descriptor_pool(
        &self,
        max_sets: u32,
        sizes: &[vk::DescriptorPoolSize],
    ) -> VkResult<vk::DescriptorPool>;
    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);
    fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> VkResult<vk::DescriptorSet>;
    fn write_descriptor_set(&self, set: vk::DescriptorSet, binding: u32, write: &DescriptorWrite);

    // ---- 管线 ----

    fn create_pipeline_layout(
        &self,
        set_layouts: &[vk::DescriptorSetLayout],
    ) -> VkResult<vk::PipelineLayout>;
    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);
    fn create_compute_pipeline(
        &self,
        layout: vk::PipelineLayout,
        module: vk::ShaderModule,
        entry_point: &CStr,
    ) -> VkResult<vk::Pipeline>;
    fn destroy_pipeline(&self, pipeline: vk::Pipeline);

    // ---- 查询 ----

    fn create_query_pool(
        &self,
        query_type: vk::QueryType,
        query_count: u32,
        statistics: vk::QueryPipelineStatisticFlags,
    ) -> VkResult<vk::QueryPool>;
    fn destroy_query_pool(&self, pool: vk::QueryPool);

    /// 阻塞读取查询结果（64 位，等待可用）
    ///
    /// `out` 的长度必须是 `query_count * values_per_query`。
    fn get_query_results(
        &self,
        pool: vk::QueryPool,
        query_count: u32,
        values_per_query: u32,
        out: &mut [u64],
    ) -> VkResult<()>;

    // ---- 命令录制 ----

    fn cmd_pipeline_barrier(
        &self,
        command_buffer: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        buffer_barriers: &[vk::BufferMemoryBarrier],
        image_barriers: &[vk::ImageMemoryBarrier],
    );
    fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
    );
    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer);
    fn cmd_clear_color_image(
        &self,
        command_buffer: vk::CommandBuffer,
        image: vk::Image,
        layout: vk::ImageLayout,
        color: [f32; 4],
        range: vk::ImageSubresourceRange,
    );
    fn cmd_clear_depth_stencil_image(
        &self,
        command_buffer: vk::CommandBuffer,
        image: vk::Image,
        layout: vk::ImageLayout,
        depth: f32,
        stencil: u32,
        range: vk::ImageSubresourceRange,
    );
    fn cmd_clear_attachments(
        &self,
        command_buffer: vk::CommandBuffer,
        attachments: &[vk::ClearAttachment],
        rect: vk::ClearRect,
    );
    fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: vk::Viewport);
    fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: vk::Rect2D);
    fn cmd_bind_vertex_buffers(
        &self,
        command_buffer: vk::CommandBuffer,
        first_binding: u32,
        buffers: &[vk::Buffer],
        offsets: &[vk::DeviceSize],
    );
    fn cmd_bind_index_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    );
    fn cmd_draw(
        &self,
        command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );
    fn cmd_draw_indexed(
        &self,
        command_buffer: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );
    fn cmd_dispatch(&self, command_buffer: vk::CommandBuffer, x: u32, y: u32, z: u32);
    fn cmd_copy_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        region: vk::BufferCopy,
    );
    fn cmd_copy_image(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        region: vk::ImageCopy,
    );
    fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        region: vk::BufferImageCopy,
    );
    fn cmd_bind_pipeline(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    );
    fn cmd_bind_descriptor_set(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        set_index: u32,
        set: vk::DescriptorSet,
    );
    fn cmd_reset_query_pool(
        &self,
        command_buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        first_query: u32,
        query_count: u32,
    );
    fn cmd_write_timestamp(
        &self,
        command_buffer: vk::CommandBuffer,
        stage: vk::PipelineStageFlags,
        pool: vk::QueryPool,
        query: u32,
    );
    fn cmd_begin_query(
        &self,
        command_buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        query: u32,
        flags: vk::QueryControlFlags,
    );
    fn cmd_end_query(&self, command_buffer: vk::CommandBuffer, pool: vk::QueryPool, query: u32);
    fn cmd_begin_debug_label(&self, command_buffer: vk::CommandBuffer, name: &CStr, color: [f32; 4]);
    fn cmd_end_debug_label(&self, command_buffer: vk::CommandBuffer);
}
