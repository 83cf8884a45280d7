//! 基于 ash 的逻辑设备实现
//!
//! `AshDevice` 包装一个外部创建好的 `ash::Device`，把 `DeviceApi` 的每个入口
//! 转换成对应的 Vulkan 调用。实例、物理设备和逻辑设备的创建不在本模块的职责内，
//! 设备的销毁也由创建者负责。

use std::ffi::CStr;

use ash::extensions::ext::DebugUtils;
use ash::prelude::VkResult;
use ash::vk;
use tracing::{debug, info};

use crate::gfx::backend::{DescriptorWrite, DeviceApi, DeviceQueue, RenderPassLayout};
use crate::renderer::command::QueueType;

/// 各类队列的队列族与队列
#[derive(Debug, Clone, Copy)]
pub struct DeviceQueues {
    /// 图形队列（支持图形、计算、传输）
    pub graphics: DeviceQueue,
    /// 计算队列
    pub compute: DeviceQueue,
    /// 传输队列
    pub copy: DeviceQueue,
}

impl DeviceQueues {
    /// 所有队列类型共用同一个队列
    pub fn shared(queue: DeviceQueue) -> Self {
        Self {
            graphics: queue,
            compute: queue,
            copy: queue,
        }
    }
}

/// ash 逻辑设备
///
/// # 字段说明
///
/// - `device`：外部创建的逻辑设备
/// - `queues`：按队列类型划分的队列族和队列
/// - `timestamp_period`：物理设备的时间戳粒度（纳秒/计数）
/// - `debug_utils`：可选的调试标签扩展
pub struct AshDevice {
    device: ash::Device,
    queues: DeviceQueues,
    timestamp_period: f32,
    debug_utils: Option<DebugUtils>,
}

impl AshDevice {
    /// 包装一个已经创建好的逻辑设备
    ///
    /// # 参数
    ///
    /// * `device` - ash 逻辑设备
    /// * `queues` - 各类队列
    /// * `timestamp_period` - `VkPhysicalDeviceLimits::timestampPeriod`
    /// * `debug_utils` - 启用了 VK_EXT_debug_utils 时传入其加载器
    pub fn new(
        device: ash::Device,
        queues: DeviceQueues,
        timestamp_period: f32,
        debug_utils: Option<DebugUtils>,
    ) -> Self {
        info!(
            graphics_family = queues.graphics.family_index,
            compute_family = queues.compute.family_index,
            copy_family = queues.copy.family_index,
            timestamp_period,
            debug_labels = debug_utils.is_some(),
            "Vulkan device wrapped"
        );

        Self {
            device,
            queues,
            timestamp_period,
            debug_utils,
        }
    }

    /// 获取底层 ash 设备
    pub fn raw(&self) -> &ash::Device {
        &self.device
    }
}

impl DeviceApi for AshDevice {
    fn queue(&self, queue_type: QueueType) -> DeviceQueue {
        match queue_type {
            QueueType::Graphics => self.queues.graphics,
            QueueType::Compute => self.queues.compute,
            QueueType::Copy => self.queues.copy,
        }
    }

    fn timestamp_period(&self) -> f32 {
        self.timestamp_period
    }

    fn supports_debug_labels(&self) -> bool {
        self.debug_utils.is_some()
    }

    fn create_fence(&self, signaled: bool) -> VkResult<vk::Fence> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let info = vk::FenceCreateInfo::builder().flags(flags);
        unsafe { self.device.create_fence(&info, None) }
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        unsafe { self.device.destroy_fence(fence, None) }
    }

    fn create_semaphore(&self) -> VkResult<vk::Semaphore> {
        let info = vk::SemaphoreCreateInfo::builder();
        unsafe { self.device.create_semaphore(&info, None) }
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        unsafe { self.device.destroy_semaphore(semaphore, None) }
    }

    fn wait_for_fence(&self, fence: vk::Fence, timeout_ns: u64) -> VkResult<()> {
        unsafe { self.device.wait_for_fences(&[fence], true, timeout_ns) }
    }

    fn reset_fence(&self, fence: vk::Fence) -> VkResult<()> {
        unsafe { self.device.reset_fences(&[fence]) }
    }

    fn fence_status(&self, fence: vk::Fence) -> VkResult<bool> {
        unsafe { self.device.get_fence_status(fence) }
    }

    fn wait_idle(&self) -> VkResult<()> {
        unsafe { self.device.device_wait_idle() }
    }

    fn queue_submit(
        &self,
        queue: vk::Queue,
        command_buffer: vk::CommandBuffer,
        wait: &[(vk::Semaphore, vk::PipelineStageFlags)],
        signal: &[vk::Semaphore],
        fence: vk::Fence,
    ) -> VkResult<()> {
        let wait_semaphores: Vec<vk::Semaphore> = wait.iter().map(|(s, _)| *s).collect();
        let wait_stages: Vec<vk::PipelineStageFlags> = wait.iter().map(|(_, st)| *st).collect();
        let command_buffers = [command_buffer];

        let submit = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(signal)
            .build();

        unsafe { self.device.queue_submit(queue, &[submit], fence) }
    }

    fn create_command_pool(&self, queue_family_index: u32) -> VkResult<vk::CommandPool> {
        let info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        unsafe { self.device.create_command_pool(&info, None) }
    }

    fn reset_command_pool(&self, pool: vk::CommandPool) -> VkResult<()> {
        unsafe {
            self.device
                .reset_command_pool(pool, vk::CommandPoolResetFlags::empty())
        }
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        unsafe { self.device.destroy_command_pool(pool, None) }
    }

    fn allocate_command_buffer(&self, pool: vk::CommandPool) -> VkResult<vk::CommandBuffer> {
        let info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let buffers = unsafe { self.device.allocate_command_buffers(&info)? };
        buffers
            .into_iter()
            .next()
            .ok_or(vk::Result::ERROR_OUT_OF_POOL_MEMORY)
    }

    fn free_command_buffer(&self, pool: vk::CommandPool, command_buffer: vk::CommandBuffer) {
        unsafe { self.device.free_command_buffers(pool, &[command_buffer]) }
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
        let info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { self.device.begin_command_buffer(command_buffer, &info) }
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
        unsafe { self.device.end_command_buffer(command_buffer) }
    }

    fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
        unsafe {
            self.device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
        }
    }

    fn create_render_pass(&self, layout: &RenderPassLayout) -> VkResult<vk::RenderPass> {
        let mut subpass = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&layout.color_refs);
        if let Some(depth_ref) = layout.depth_ref.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }
        let subpasses = [subpass.build()];
        let dependencies = [layout.dependency];

        let info = vk::RenderPassCreateInfo::builder()
            .attachments(&layout.attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe { self.device.create_render_pass(&info, None)? };
        debug!(
            attachments = layout.attachments.len(),
            depth = layout.depth_ref.is_some(),
            "Render pass created"
        );
        Ok(render_pass)
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        unsafe { self.device.destroy_render_pass(render_pass, None) }
    }

    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VkResult<vk::Framebuffer> {
        let info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);
        unsafe { self.device.create_framebuffer(&info, None) }
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        unsafe { self.device.destroy_framebuffer(framebuffer, None) }
    }

    fn create_descriptor_set_layout(
        &self,
        descriptor_type: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
    ) -> VkResult<vk::DescriptorSetLayout> {
        let bindings = [vk::DescriptorSetLayoutBinding::builder()
            .binding(0)
            .descriptor_type(descriptor_type)
            .descriptor_count(1)
            .stage_flags(stages)
            .build()];
        let info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&bindings);
        unsafe { self.device.create_descriptor_set_layout(&info, None) }
    }

    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        unsafe { self.device.destroy_descriptor_set_layout(layout, None) }
    }

    fn create_descriptor_pool(
        &self,
        max_sets: u32,
        sizes: &[vk::DescriptorPoolSize],
    ) -> VkResult<vk::DescriptorPool> {
        let info = vk::DescriptorPoolCreateInfo::builder()
            .max_sets(max_sets)
            .pool_sizes(sizes);
        unsafe { self.device.create_descriptor_pool(&info, None) }
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        unsafe { self.device.destroy_descriptor_pool(pool, None) }
    }

    fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> VkResult<vk::DescriptorSet> {
        let layouts = [layout];
        let info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(pool)
            .set_layouts(&layouts);

        let sets = unsafe { self.device.allocate_descriptor_sets(&info)? };
        sets.into_iter()
            .next()
            .ok_or(vk::Result::ERROR_OUT_OF_POOL_MEMORY)
    }

    fn write_descriptor_set(&self, set: vk::DescriptorSet, binding: u32, write: &DescriptorWrite) {
        let base = vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(binding)
            .dst_array_element(0)
            .descriptor_type(write.descriptor_type());

        match *write {
            DescriptorWrite::UniformBuffer { buffer, offset, range } => {
                let infos = [vk::DescriptorBufferInfo {
                    buffer,
                    offset,
                    range,
                }];
                let writes = [base.buffer_info(&infos).build()];
                unsafe { self.device.update_descriptor_sets(&writes, &[]) }
            }
            DescriptorWrite::SampledImage { view, layout }
            | DescriptorWrite::StorageImage { view, layout } => {
                let infos = [vk::DescriptorImageInfo {
                    sampler: vk::Sampler::null(),
                    image_view: view,
                    image_layout: layout,
                }];
                let writes = [base.image_info(&infos).build()];
                unsafe { self.device.update_descriptor_sets(&writes, &[]) }
            }
        }
    }

    fn create_pipeline_layout(
        &self,
        set_layouts: &[vk::DescriptorSetLayout],
    ) -> VkResult<vk::PipelineLayout> {
        let info = vk::PipelineLayoutCreateInfo::builder().set_layouts(set_layouts);
        unsafe { self.device.create_pipeline_layout(&info, None) }
    }

    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        unsafe { self.device.destroy_pipeline_layout(layout, None) }
    }

    fn create_compute_pipeline(
        &self,
        layout: vk::PipelineLayout,
        module: vk::ShaderModule,
        entry_point: &CStr,
    ) -> VkResult<vk::Pipeline> {
        let stage = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(module)
            .name(entry_point)
            .build();
        let infos = [vk::ComputePipelineCreateInfo::builder()
            .stage(stage)
            .layout(layout)
            .build()];

        let pipelines = unsafe {
            self.device
                .create_compute_pipelines(vk::PipelineCache::null(), &infos, None)
                .map_err(|(_, err)| err)?
        };
        pipelines
            .into_iter()
            .next()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe { self.device.destroy_pipeline(pipeline, None) }
    }

    fn create_query_pool(
        &self,
        query_type: vk::QueryType,
        query_count: u32,
        statistics: vk::QueryPipelineStatisticFlags,
    ) -> VkResult<vk::QueryPool> {
        let info = vk::QueryPoolCreateInfo::builder()
            .query_type(query_type)
            .query_count(query_count)
            .pipeline_statistics(statistics);
        unsafe { self.device.create_query_pool(&info, None) }
    }

    fn destroy_query_pool(&self, pool: vk::QueryPool) {
        unsafe { self.device.destroy_query_pool(pool, None) }
    }

    fn get_query_results(
        &self,
        pool: vk::QueryPool,
        query_count: u32,
        values_per_query: u32,
        out: &mut [u64],
    ) -> VkResult<()> {
        let value_size = std::mem::size_of::<u64>();
        let expected = (query_count * values_per_query) as usize;
        if out.len() < expected {
            return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
        }

        // ash 的封装要求步长等于元素大小，这里直接走函数指针以支持每个查询多个值
        unsafe {
            (self.device.fp_v1_0().get_query_pool_results)(
                self.device.handle(),
                pool,
                0,
                query_count,
                expected * value_size,
                out.as_mut_ptr().cast(),
                (values_per_query as usize * value_size) as vk::DeviceSize,
                vk::QueryResultFlags::TYPE_64 | vk::QueryResultFlags::WAIT,
            )
            .result()
        }
    }

    fn cmd_pipeline_barrier(
        &self,
        command_buffer: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        buffer_barriers: &[vk::BufferMemoryBarrier],
        image_barriers: &[vk::ImageMemoryBarrier],
    ) {
        unsafe {
            self.device.cmd_pipeline_barrier(
                command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                buffer_barriers,
                image_barriers,
            )
        }
    }

    fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
    ) {
        let info = vk::RenderPassBeginInfo::builder()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            });
        unsafe {
            self.device
                .cmd_begin_render_pass(command_buffer, &info, vk::SubpassContents::INLINE)
        }
    }

    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        unsafe { self.device.cmd_end_render_pass(command_buffer) }
    }

    fn cmd_clear_color_image(
        &self,
        command_buffer: vk::CommandBuffer,
        image: vk::Image,
        layout: vk::ImageLayout,
        color: [f32; 4],
        range: vk::ImageSubresourceRange,
    ) {
        let value = vk::ClearColorValue { float32: color };
        unsafe {
            self.device
                .cmd_clear_color_image(command_buffer, image, layout, &value, &[range])
        }
    }

    fn cmd_clear_depth_stencil_image(
        &self,
        command_buffer: vk::CommandBuffer,
        image: vk::Image,
        layout: vk::ImageLayout,
        depth: f32,
        stencil: u32,
        range: vk::ImageSubresourceRange,
    ) {
        let value = vk::ClearDepthStencilValue { depth, stencil };
        unsafe {
            self.device
                .cmd_clear_depth_stencil_image(command_buffer, image, layout, &value, &[range])
        }
    }

    fn cmd_clear_attachments(
        &self,
        command_buffer: vk::CommandBuffer,
        attachments: &[vk::ClearAttachment],
        rect: vk::ClearRect,
    ) {
        unsafe {
            self.device
                .cmd_clear_attachments(command_buffer, attachments, &[rect])
        }
    }

    fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: vk::Viewport) {
        unsafe { self.device.cmd_set_viewport(command_buffer, 0, &[viewport]) }
    }

    fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: vk::Rect2D) {
        unsafe { self.device.cmd_set_scissor(command_buffer, 0, &[scissor]) }
    }

    fn cmd_bind_vertex_buffers(
        &self,
        command_buffer: vk::CommandBuffer,
        first_binding: u32,
        buffers: &[vk::Buffer],
        offsets: &[vk::DeviceSize],
    ) {
        unsafe {
            self.device
                .cmd_bind_vertex_buffers(command_buffer, first_binding, buffers, offsets)
        }
    }

    fn cmd_bind_index_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    ) {
        unsafe {
            self.device
                .cmd_bind_index_buffer(command_buffer, buffer, offset, index_type)
        }
    }

    fn cmd_draw(
        &self,
        command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        unsafe {
            self.device.cmd_draw(
                command_buffer,
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            )
        }
    }

    fn cmd_draw_indexed(
        &self,
        command_buffer: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        unsafe {
            self.device.cmd_draw_indexed(
                command_buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            )
        }
    }

    fn cmd_dispatch(&self, command_buffer: vk::CommandBuffer, x: u32, y: u32, z: u32) {
        unsafe { self.device.cmd_dispatch(command_buffer, x, y, z) }
    }

    fn cmd_copy_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        region: vk::BufferCopy,
    ) {
        unsafe { self.device.cmd_copy_buffer(command_buffer, src, dst, &[region]) }
    }

    fn cmd_copy_image(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Image,
        dst: vk::Image,
        region: vk::ImageCopy,
    ) {
        unsafe {
            self.device.cmd_copy_image(
                command_buffer,
                src,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            )
        }
    }

    fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Image,
        region: vk::BufferImageCopy,
    ) {
        unsafe {
            self.device.cmd_copy_buffer_to_image(
                command_buffer,
                src,
                dst,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            )
        }
    }

    fn cmd_bind_pipeline(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        pipeline: vk::Pipeline,
    ) {
        unsafe {
            self.device
                .cmd_bind_pipeline(command_buffer, bind_point, pipeline)
        }
    }

    fn cmd_bind_descriptor_set(
        &self,
        command_buffer: vk::CommandBuffer,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        set_index: u32,
        set: vk::DescriptorSet,
    ) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                command_buffer,
                bind_point,
                layout,
                set_index,
                &[set],
                &[],
            )
        }
    }

    fn cmd_reset_query_pool(
        &self,
        command_buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        first_query: u32,
        query_count: u32,
    ) {
        unsafe {
            self.device
                .cmd_reset_query_pool(command_buffer, pool, first_query, query_count)
        }
    }

    fn cmd_write_timestamp(
        &self,
        command_buffer: vk::CommandBuffer,
        stage: vk::PipelineStageFlags,
        pool: vk::QueryPool,
        query: u32,
    ) {
        unsafe {
            self.device
                .cmd_write_timestamp(command_buffer, stage, pool, query)
        }
    }

    fn cmd_begin_query(
        &self,
        command_buffer: vk::CommandBuffer,
        pool: vk::QueryPool,
        query: u32,
        flags: vk::QueryControlFlags,
    ) {
        unsafe {
            self.device
                .cmd_begin_query(command_buffer, pool, query, flags)
        }
    }

    fn cmd_end_query(&self, command_buffer: vk::CommandBuffer, pool: vk::QueryPool, query: u32) {
        unsafe { self.device.cmd_end_query(command_buffer, pool, query) }
    }

    fn cmd_begin_debug_label(&self, command_buffer: vk::CommandBuffer, name: &CStr, color: [f32; 4]) {
        if let Some(debug_utils) = &self.debug_utils {
            let label = vk::DebugUtilsLabelEXT::builder()
                .label_name(name)
                .color(color);
            unsafe { debug_utils.cmd_begin_debug_utils_label(command_buffer, &label) }
        }
    }

    fn cmd_end_debug_label(&self, command_buffer: vk::CommandBuffer) {
        if let Some(debug_utils) = &self.debug_utils {
            unsafe { debug_utils.cmd_end_debug_utils_label(command_buffer) }
        }
    }
}
