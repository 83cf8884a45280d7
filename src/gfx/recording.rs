//! 录制型设备（测试用）
//!
//! `RecordingDevice` 实现 `DeviceApi`，不访问 GPU，而是把每次调用记录成 `Call`。
//! Fence 的 signal 状态在内存中模拟：提交时（默认）立即完成。
//! 可以通过 `fail_on` 让指定的创建调用失败，用于测试错误路径。

use std::collections::{HashMap, HashSet};
use std::ffi::CStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ash::prelude::VkResult;
use ash::vk::{self, Handle};

use crate::gfx::backend::{DescriptorWrite, DeviceApi, DeviceQueue, RenderPassLayout};
use crate::renderer::command::QueueType;

/// 附件描述记录
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentRecord {
    pub format: vk::Format,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub stencil_load_op: vk::AttachmentLoadOp,
    pub stencil_store_op: vk::AttachmentStoreOp,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
}

/// 图像屏障记录
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBarrierRecord {
    pub image: vk::Image,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    pub aspect: vk::ImageAspectFlags,
    pub level_count: u32,
    pub layer_count: u32,
}

/// 缓冲屏障记录
#[derive(Debug, Clone, PartialEq)]
pub struct BufferBarrierRecord {
    pub buffer: vk::Buffer,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub offset: vk::DeviceSize,
    pub size: vk::DeviceSize,
}

/// 一次设备调用
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateFence { fence: vk::Fence, signaled: bool },
    DestroyFence(vk::Fence),
    CreateSemaphore(vk::Semaphore),
    DestroySemaphore(vk::Semaphore),
    WaitForFence(vk::Fence),
    ResetFence(vk::Fence),
    WaitIdle,
    Submit {
        queue: vk::Queue,
        command_buffer: vk::CommandBuffer,
        wait: Vec<vk::Semaphore>,
        signal: Vec<vk::Semaphore>,
        fence: vk::Fence,
    },

    CreateCommandPool { pool: vk::CommandPool, family_index: u32 },
    ResetCommandPool(vk::CommandPool),
    DestroyCommandPool(vk::CommandPool),
    AllocateCommandBuffer(vk::CommandBuffer),
    FreeCommandBuffer(vk::CommandBuffer),
    BeginCommandBuffer(vk::CommandBuffer),
    EndCommandBuffer(vk::CommandBuffer),
    ResetCommandBuffer(vk::CommandBuffer),

    CreateRenderPass {
        render_pass: vk::RenderPass,
        attachments: Vec<AttachmentRecord>,
        color_refs: Vec<u32>,
        depth_ref: Option<u32>,
        dependency_dst_stage: vk::PipelineStageFlags,
        dependency_dst_access: vk::AccessFlags,
    },
    DestroyRenderPass(vk::RenderPass),
    CreateFramebuffer {
        framebuffer: vk::Framebuffer,
        render_pass: vk::RenderPass,
        attachments: Vec<vk::ImageView>,
        width: u32,
        height: u32,
    },
    DestroyFramebuffer(vk::Framebuffer),

    CreateDescriptorSetLayout {
        layout: vk::DescriptorSetLayout,
        descriptor_type: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
    },
    DestroyDescriptorSetLayout(vk::DescriptorSetLayout),
    CreateDescriptorPool {
        pool: vk::DescriptorPool,
        max_sets: u32,
        descriptor_count: u32,
    },
    DestroyDescriptorPool(vk::DescriptorPool),
    AllocateDescriptorSet {
        set: vk::DescriptorSet,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    },
    WriteDescriptorSet {
        set: vk::DescriptorSet,
        binding: u32,
        write: DescriptorWrite,
    },

    CreatePipelineLayout {
        layout: vk::PipelineLayout,
        set_layouts: Vec<vk::DescriptorSetLayout>,
    },
    DestroyPipelineLayout(vk::PipelineLayout),
    CreateComputePipeline {
        pipeline: vk::Pipeline,
        layout: vk::PipelineLayout,
        module: vk::ShaderModule,
    },
    DestroyPipeline(vk::Pipeline),

    CreateQueryPool {
        pool: vk::QueryPool,
        query_type: vk::QueryType,
        query_count: u32,
        statistics: vk::QueryPipelineStatisticFlags,
    },
    DestroyQueryPool(vk::QueryPool),
    GetQueryResults(vk::QueryPool),

    PipelineBarrier {
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        buffers: Vec<BufferBarrierRecord>,
        images: Vec<ImageBarrierRecord>,
    },
    BeginRenderPass {
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        width: u32,
        height: u32,
    },
    EndRenderPass,
    ClearColorImage {
        image: vk::Image,
        layout: vk::ImageLayout,
        color: [f32; 4],
    },
    ClearDepthStencilImage {
        image: vk::Image,
        layout: vk::ImageLayout,
        depth: f32,
        stencil: u32,
        aspect: vk::ImageAspectFlags,
    },
    ClearAttachments {
        attachments: Vec<(vk::ImageAspectFlags, u32)>,
        width: u32,
        height: u32,
    },
    SetViewport { x: f32, y: f32, width: f32, height: f32 },
    SetScissor { x: i32, y: i32, width: u32, height: u32 },
    BindVertexBuffers {
        first_binding: u32,
        buffers: Vec<vk::Buffer>,
        offsets: Vec<vk::DeviceSize>,
    },
    BindIndexBuffer {
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    Dispatch { x: u32, y: u32, z: u32 },
    CopyBuffer {
        src: vk::Buffer,
        dst: vk::Buffer,
        src_offset: vk::DeviceSize,
        dst_offset: vk::DeviceSize,
        size: vk::DeviceSize,
    },
    CopyImage {
        src: vk::Image,
        dst: vk::Image,
        width: u32,
        height: u32,
        depth: u32,
    },
    CopyBufferToImage {
        src: vk::Buffer,
        dst: vk::Image,
        buffer_offset: vk::DeviceSize,
    },
    BindPipeline {
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    },
    BindDescriptorSet {
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        set_index: u32,
        set: vk::DescriptorSet,
    },
    ResetQueryPool {
        pool: vk::QueryPool,
        first_query: u32,
        query_count: u32,
    },
    WriteTimestamp {
        stage: vk::PipelineStageFlags,
        pool: vk::QueryPool,
        query: u32,
    },
    BeginQuery {
        pool: vk::QueryPool,
        query: u32,
        flags: vk::QueryControlFlags,
    },
    EndQuery { pool: vk::QueryPool, query: u32 },
    BeginDebugLabel(String),
    EndDebugLabel,
}

impl Call {
    /// 是否是录制到命令缓冲中的命令
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Call::PipelineBarrier { .. }
                | Call::BeginRenderPass { .. }
                | Call::EndRenderPass
                | Call::ClearColorImage { .. }
                | Call::ClearDepthStencilImage { .. }
                | Call::ClearAttachments { .. }
                | Call::SetViewport { .. }
                | Call::SetScissor { .. }
                | Call::BindVertexBuffers { .. }
                | Call::BindIndexBuffer { .. }
                | Call::Draw { .. }
                | Call::DrawIndexed { .. }
                | Call::Dispatch { .. }
                | Call::CopyBuffer { .. }
                | Call::CopyImage { .. }
                | Call::CopyBufferToImage { .. }
                | Call::BindPipeline { .. }
                | Call::BindDescriptorSet { .. }
                | Call::ResetQueryPool { .. }
                | Call::WriteTimestamp { .. }
                | Call::BeginQuery { .. }
                | Call::EndQuery { .. }
                | Call::BeginDebugLabel(_)
                | Call::EndDebugLabel
        )
    }
}

struct Inner {
    calls: Vec<Call>,
    next_handle: u64,
    fences: HashMap<vk::Fence, bool>,
    failures: HashSet<&'static str>,
    query_values: Vec<u64>,
    complete_on_submit: bool,
    timestamp_valid_bits: u32,
}

/// 记录所有调用的设备
pub struct RecordingDevice {
    inner: Mutex<Inner>,
    timestamp_period: f32,
    debug_labels: bool,
}

impl RecordingDevice {
    /// 创建设备（时间戳粒度 1ns，支持调试标签）
    pub fn new() -> Arc<Self> {
        Self::with_options(1.0, true)
    }

    pub fn with_options(timestamp_period: f32, debug_labels: bool) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                calls: Vec::new(),
                next_handle: 0x1000,
                fences: HashMap::new(),
                failures: HashSet::new(),
                query_values: Vec::new(),
                complete_on_submit: true,
                timestamp_valid_bits: 64,
            }),
            timestamp_period,
            debug_labels,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    fn next_handle<H: Handle>(&self) -> H {
        let mut inner = self.lock();
        inner.next_handle += 1;
        H::from_raw(inner.next_handle)
    }

    fn check(&self, operation: &'static str) -> VkResult<()> {
        if self.lock().failures.contains(operation) {
            Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
        } else {
            Ok(())
        }
    }

    /// 所有已记录的调用
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// 只保留录制命令
    pub fn commands(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_command).collect()
    }

    /// 满足条件的调用数量
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// 让指定名字的调用失败（名字与 `DeviceApi` 方法名一致）
    pub fn fail_on(&self, operation: &'static str) {
        self.lock().failures.insert(operation);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// 设置查询读回的数据
    pub fn set_query_results(&self, values: Vec<u64>) {
        self.lock().query_values = values;
    }

    /// 所有队列族的时间戳有效位数
    pub fn set_timestamp_valid_bits(&self, bits: u32) {
        self.lock().timestamp_valid_bits = bits;
    }

    /// 提交后是否立即 signal Fence
    pub fn set_complete_on_submit(&self, complete: bool) {
        self.lock().complete_on_submit = complete;
    }

    /// 模拟 GPU 完成工作
    pub fn signal_fence(&self, fence: vk::Fence) {
        self.lock().fences.insert(fence, true);
    }

    pub fn is_fence_signaled(&self, fence: vk::Fence) -> bool {
        self.lock().fences.get(&fence).copied().unwrap_or(false)
    }
}

impl DeviceApi for RecordingDevice {
    fn queue(&self, queue_type: QueueType) -> DeviceQueue {
        let family_index = match queue_type {
            QueueType::Graphics => 0,
            QueueType::Compute => 1,
            QueueType::Copy => 2,
        };
        DeviceQueue {
            family_index,
            queue: vk::Queue::from_raw(0x100 + family_index as u64),
            timestamp_valid_bits: self.lock().timestamp_valid_bits,
        }
    }

    fn timestamp_period(&self) -> f32 {
        self.timestamp_period
    }

    fn supports_debug_labels(&self) -> bool {
        self.debug_labels
    }

    fn create_fence(&self, signaled: bool) -> VkResult<vk::Fence> {
        self.check("create_fence")?;
        let fence: vk::Fence = self.next_handle();
        self.lock().fences.insert(fence, signaled);
        self.record(Call::CreateFence { fence, signaled });
        Ok(fence)
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        self.lock().fences.remove(&fence);
        self.record(Call::DestroyFence(fence));
    }

    fn create_semaphore(&self) -> VkResult<vk::Semaphore> {
        self.check("create_semaphore")?;
        let semaphore = self.next_handle();
        self.record(Call::CreateSemaphore(semaphore));
        Ok(semaphore)
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.record(Call::DestroySemaphore(semaphore));
    }

    fn wait_for_fence(&self, fence: vk::Fence, _timeout_ns: u64) -> VkResult<()> {
        self.record(Call::WaitForFence(fence));
        if self.is_fence_signaled(fence) {
            Ok(())
        } else {
            Err(vk::Result::TIMEOUT)
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> VkResult<()> {
        self.check("reset_fence")?;
        self.lock().fences.insert(fence, false);
        self.record(Call::ResetFence(fence));
        Ok(())
    }

    fn fence_status(&self, fence: vk::Fence) -> VkResult<bool> {
        Ok(self.is_fence_signaled(fence))
    }

    fn wait_idle(&self) -> VkResult<()> {
        self.record(Call::WaitIdle);
        Ok(())
    }

    fn queue_submit(
        &self,
        queue: vk::Queue,
        command_buffer: vk::CommandBuffer,
        wait: &[(vk::Semaphore, vk::PipelineStageFlags)],
        signal: &[vk::Semaphore],
        fence: vk::Fence,
    ) -> VkResult<()> {
        self.check("queue_submit")?;
        self.record(Call::Submit {
            queue,
            command_buffer,
            wait: wait.iter().map(|(s, _)| *s).collect(),
            signal: signal.to_vec(),
            fence,
        });
        let mut inner = self.lock();
        if inner.complete_on_submit && fence != vk::Fence::null() {
            inner.fences.insert(fence, true);
        }
        Ok(())
    }

    fn create_command_pool(&self, queue_family_index: u32) -> VkResult<vk::CommandPool> {
        self.check("create_command_pool")?;
        let pool = self.next_handle();
        self.record(Call::CreateCommandPool {
            pool,
            family_index: queue_family_index,
        });
        Ok(pool)
    }

    fn reset_command_pool(&self, pool: vk::CommandPool) -> VkResult<()> {
        self.record(Call::ResetCommandPool(pool));
        Ok(())
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.record(Call::DestroyCommandPool(pool));
    }

    fn allocate_command_buffer(&self, _pool: vk::CommandPool) -> VkResult<vk::CommandBuffer> {
        self.check("allocate_command_buffer")?;
        let buffer = self.next_handle();
        self.record(Call::AllocateCommandBuffer(buffer));
        Ok(buffer)
    }

    fn free_command_buffer(&self, _pool: vk::CommandPool, command_buffer: vk::CommandBuffer) {
        self.record(Call::FreeCommandBuffer(command_buffer));
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
        self.check("begin_command_buffer")?;
        self.record(Call::BeginCommandBuffer(command_buffer));
        Ok(())
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
        self.check("end_command_buffer")?;
        self.record(Call::EndCommandBuffer(command_buffer));
        Ok(())
    }

    fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
        self.record(Call::ResetCommandBuffer(command_buffer));
        Ok(())
    }

    fn create_render_pass(&self, layout: &RenderPassLayout) -> VkResult<vk::RenderPass> {
        self.check("create_render_pass")?;
        let render_pass = self.next_handle();
        self.record(Call::CreateRenderPass {
            render_pass,
            attachments: layout
                .attachments
                .iter()
                .map(|a| AttachmentRecord {
                    format: a.format,
                    load_op: a.load_op,
                    store_op: a.store_op,
                    stencil_load_op: a.stencil_load_op,
                    stencil_store_op: a.stencil_store_op,
                    initial_layout: a.initial_layout,
                    final_layout: a.final_layout,
                })
                .collect(),
            color_refs: layout.color_refs.iter().map(|r| r.attachment).collect(),
            depth_ref: layout.depth_ref.map(|r| r.attachment),
            dependency_dst_stage: layout.dependency.dst_stage_mask,
            dependency_dst_access: layout.dependency.dst_access_mask,
        });
        Ok(render_pass)
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        self.record(Call::DestroyRenderPass(render_pass));
    }

    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VkResult<vk::Framebuffer> {
        self.check("create_framebuffer")?;
        let framebuffer = self.next_handle();
        self.record(Call::CreateFramebuffer {
            framebuffer,
            render_pass,
            attachments: attachments.to_vec(),
            width: extent.width,
            height: extent.height,
        });
        Ok(framebuffer)
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.record(Call::DestroyFramebuffer(framebuffer));
    }

    fn create_descriptor_set_layout(
        &self,
        descriptor_type: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
    ) -> VkResult<vk::DescriptorSetLayout> {
        self.check("create_descriptor_set_layout")?;
        let layout = self.next_handle();
        self.record(Call::CreateDescriptorSetLayout {
            layout,
            descriptor_type,
            stages,
        });
        Ok(layout)
    }

    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        self.record(Call::DestroyDescriptorSetLayout(layout));
    }

    fn create_descriptor_pool(
        &self,
        max_sets: u32,
        sizes: &[vk::DescriptorPoolSize],
    ) -> VkResult<vk::DescriptorPool> {
        self.check("create_descriptor_pool")?;
        let pool = self.next_handle();
        self.record(Call::CreateDescriptorPool {
            pool,
            max_sets,
            descriptor_count: sizes.iter().map(|s| s.descriptor_count).sum(),
        });
        Ok(pool)
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        self.record(Call::DestroyDescriptorPool(pool));
    }

    fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> VkResult<vk::DescriptorSet> {
        self.check("allocate_descriptor_set")?;
        let set = self.next_handle();
        self.record(Call::AllocateDescriptorSet { set, pool, layout });
        Ok(set)
    }

    fn write_descriptor_set(&self, set: vk::DescriptorSet, binding: u32, write: &DescriptorWrite) {
        self.record(Call::WriteDescriptorSet {
            set,
            binding,
            write: *write,
        });
    }

    fn create_pipeline_layout(
        &self,
        set_layouts: &[vk::DescriptorSetLayout],
    ) -> VkResult<vk::PipelineLayout> {
        self.check("create_pipeline_layout")?;
        let layout = self.next_handle();
        self.record(Call::CreatePipelineLayout {
            layout,
            set_layouts: set_layouts.to_vec(),
        });
        Ok(layout)
    }

    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.record(Call::DestroyPipelineLayout(layout));
    }

    fn create_compute_pipeline(
        &self,
        layout: vk::PipelineLayout,
        module: vk::ShaderModule,
        _entry_point: &CStr,
    ) -> VkResult<vk::Pipeline> {
        self.check("create_compute_pipeline")?;
        let pipeline = self.next_handle();
        self.record(Call::CreateComputePipeline {
            pipeline,
            layout,
            module,
        });
        Ok(pipeline)
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        self.record(Call::DestroyPipeline(pipeline));
    }

    fn create_query_pool(
        &self,
        query_type: vk::QueryType,
        query_count: u32,
        statistics: vk::QueryPipelineStatisticFlags,
    ) -> VkResult<vk::QueryPool> {
        self.check("create_query_pool")?;
        let pool = self.next_handle();
        self.record(Call::CreateQueryPool {
            pool,
            query_type,
            query_count,
            statistics,
        });
        Ok(pool)
    }

    fn destroy_query_pool(&self, pool: vk::QueryPool) {
        self.record(Call::DestroyQueryPool(pool));
    }

    fn get_query_results(
        &self,
        pool: vk::QueryPool,
        _query_count: u32,
        _values_per_query: u32,
        out: &mut [u64],
    ) -> VkResult<()> {
        self.check("get_query_results")?;
        self.record(Call::GetQueryResults(pool));
        let inner = self.lock();
        for (slot, value) in out.iter_mut().enumerate() {
            *value = inner.query_values.get(slot).copied().unwrap_or(0);
        }
        Ok(())
    }

    fn cmd_pipeline_barrier(
        &self,
        _command_buffer: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        buffer_barriers: &[vk::BufferMemoryBarrier],
        image_barriers: &[vk::ImageMemoryBarrier],
    ) {
        self.record(Call::PipelineBarrier {
            src_stage,
            dst_stage,
            buffers: buffer_barriers
                .iter()
                .map(|b| BufferBarrierRecord {
                    buffer: b.buffer,
                    src_access: b.src_access_mask,
                    dst_access: b.dst_access_mask,
                    offset: b.offset,
                    size: b.size,
                })
                .collect(),
            images: image_barriers
                .iter()
                .map(|b| ImageBarrierRecord {
                    image: b.image,
                    src_access: b.src_access_mask,
                    dst_access: b.dst_access_mask,
                    old_layout: b.old_layout,
                    new_layout: b.new_layout,
                    aspect: b.subresource_range.aspect_mask,
                    level_count: b.subresource_range.level_count,
                    layer_count: b.subresource_range.layer_count,
                })
                .collect(),
        });
    }

    fn cmd_begin_render_pass(
        &self,
        _command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
    ) {
        self.record(Call::BeginRenderPass {
            render_pass,
            framebuffer,
            width: extent.width,
            height: extent.height,
        });
    }

    fn cmd_end_render_pass(&self, _command_buffer: vk::CommandBuffer) {
        self.record(Call::EndRenderPass);
    }

    fn cmd_clear_color_image(
        &self,
        _command_buffer: vk::CommandBuffer,
        image: vk::Image,
        layout: vk::ImageLayout,
        color: [f32; 4],
        _range: vk::ImageSubresourceRange,
    ) {
        self.record(Call::ClearColorImage {
            image,
            layout,
            color,
        });
    }

    fn cmd_clear_depth_stencil_image(
        &self,
        _command_buffer: vk::CommandBuffer,
        image: vk::Image,
        layout: vk::ImageLayout,
        depth: f32,
        stencil: u32,
        range: vk::ImageSubresourceRange,
    ) {
        self.record(Call::ClearDepthStencilImage {
            image,
            layout,
            depth,
            stencil,
            aspect: range.aspect_mask,
        });
    }

    fn cmd_clear_attachments(
        &self,
        _command_buffer: vk::CommandBuffer,
        attachments: &[vk::ClearAttachment],
        rect: vk::ClearRect,
    ) {
        self.record(Call::ClearAttachments {
            attachments: attachments
                .iter()
                .map(|a| (a.aspect_mask, a.color_attachment))
                .collect(),
            width: rect.rect.extent.width,
            height: rect.rect.extent.height,
        });
    }

    fn cmd_set_viewport(&self, _command_buffer: vk::CommandBuffer, viewport: vk::Viewport) {
        self.record(Call::SetViewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
        });
    }

    fn cmd_set_scissor(&self, _command_buffer: vk::CommandBuffer, scissor: vk::Rect2D) {
        self.record(Call::SetScissor {
            x: scissor.offset.x,
            y: scissor.offset.y,
            width: scissor.extent.width,
            height: scissor.extent.height,
        });
    }

    fn cmd_bind_vertex_buffers(
        &self,
        _command_buffer: vk::CommandBuffer,
        first_binding: u32,
        buffers: &[vk::Buffer],
        offsets: &[vk::DeviceSize],
    ) {
        self.record(Call::BindVertexBuffers {
            first_binding,
            buffers: buffers.to_vec(),
            offsets: offsets.to_vec(),
        });
    }

    fn cmd_bind_index_buffer(
        &self,
        _command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    ) {
        self.record(Call::BindIndexBuffer {
            buffer,
            offset,
            index_type,
        });
    }

    fn cmd_draw(
        &self,
        _command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.record(Call::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    fn cmd_draw_indexed(
        &self,
        _command_buffer: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.record(Call::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        });
    }

    fn cmd_dispatch(&self, _command_buffer: vk::CommandBuffer, x: u32, y: u32, z: u32) {
        self.record(Call::Dispatch { x, y, z });
    }

    fn cmd_copy_buffer(
        &self,
        _command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        region: vk::BufferCopy,
    ) {
        self.record(Call::CopyBuffer {
            src,
            dst,
            src_offset: region.src_offset,
            dst_offset: region.dst_offset,
            size: region.size,
        });
    }

    fn cmd_copy_image(
        &self,
        _command_buffer: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        region: vk::ImageCopy,
    ) {
        self.record(Call::CopyImage {
            src,
            dst,
            width: region.extent.width,
            height: region.extent.height,
            depth: region.extent.depth,
        });
    }

    fn cmd_copy_buffer_to_image(
        &self,
        _command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        region: vk::BufferImageCopy,
    ) {
        self.record(Call::CopyBufferToImage {
            src,
            dst,
            buffer_offset: region.buffer_offset,
        });
    }

    fn cmd_bind_pipeline(
        &self,
        _command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    ) {
        self.record(Call::BindPipeline {
            bind_point,
            pipeline,
        });
    }

    fn cmd_bind_descriptor_set(
        &self,
        _command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        set_index: u32,
        set: vk::DescriptorSet,
    ) {
        self.record(Call::BindDescriptorSet {
            bind_point,
            layout,
            set_index,
            set,
        });
    }

    fn cmd_reset_query_pool(
        &self,
        _command_buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        first_query: u32,
        query_count: u32,
    ) {
        self.record(Call::ResetQueryPool {
            pool,
            first_query,
            query_count,
        });
    }

    fn cmd_write_timestamp(
        &self,
        _command_buffer: vk::CommandBuffer,
        stage: vk::PipelineStageFlags,
        pool: vk::QueryPool,
        query: u32,
    ) {
        self.record(Call::WriteTimestamp { stage, pool, query });
    }

    fn cmd_begin_query(
        &self,
        _command_buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        query: u32,
        flags: vk::QueryControlFlags,
    ) {
        self.record(Call::BeginQuery { pool, query, flags });
    }

    fn cmd_end_query(&self, _command_buffer: vk::CommandBuffer, pool: vk::QueryPool, query: u32) {
        self.record(Call::EndQuery { pool, query });
    }

    fn cmd_begin_debug_label(&self, _command_buffer: vk::CommandBuffer, name: &CStr, _color: [f32; 4]) {
        self.record(Call::BeginDebugLabel(name.to_string_lossy().into_owned()));
    }

    fn cmd_end_debug_label(&self, _command_buffer: vk::CommandBuffer) {
        self.record(Call::EndDebugLabel);
    }
}
