//! 命令列表
//!
//! 命令录制核心的状态机。对上层提供与 DX12 `ID3D12GraphicsCommandList`
//! 类似的接口，内部翻译为 Vulkan 命令，并按需合成 RenderPass / Framebuffer、
//! 管理描述符和计算管线。
//!
//! # 状态转换
//!
//! ```text
//! Initial ──reset_with_allocator──▶ Recording ──set_render_targets──▶ RecordingInPass
//!                                      ▲  │                               │
//!                                      │  └──────────close───────┐        │ end_render_pass
//!                                      │                         ▼        ▼
//!                                      └────────reset──────── Closed ◀─close─┘
//! ```
//!
//! 录制操作只在 Recording / RecordingInPass 状态下生效。其他状态下调用不会产生任何命令：
//! `strict_state_checks` 开启时返回 `GraphicsError::InvalidState`，否则只记录警告。
//!
//! # 对象生命周期
//!
//! 渲染通道、帧缓冲和被替换的计算管线在下一次 reset 或命令列表销毁时才销毁，
//! 因为它们可能仍被已提交的命令缓冲引用。调用方需保证 reset 时 GPU 已经执行完毕
//! （通常借助 `CommandBufferSync::begin`）。

use std::ffi::CString;
use std::fmt;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, trace, warn};

use crate::core::config::{CommandListConfig, Config};
use crate::core::error::{GraphicsError, Result, RhiError};
use crate::gfx::{DescriptorWrite, DeviceApi};

use super::command::{CommandAllocator, CommandBuffer, QueueType};
use super::descriptor::{BindingCategory, DescriptorArena, DescriptorPoolStats};
use super::pipeline::{ComputePipeline, PipelineKind, ShaderSet, ShaderStage};
use super::render_pass::RenderTargetSet;
use super::resource::{
    BufferResource, ClearFlags, ConstantBufferView, DepthStencilView, ImageResource,
    IndexBufferView, RenderTargetView, Resource, ResourceState, ShaderResourceView,
    UnorderedAccessView, VertexBufferView,
};
use super::state::{ResourceBarrier, ResourceStateConverter, BARRIER_STAGE};

/// 调试标签颜色
const EVENT_LABEL_COLOR: [f32; 4] = [0.3, 0.6, 1.0, 1.0];

/// 命令列表状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandListState {
    /// 尚未开始录制
    Initial,
    /// 正在录制，没有打开的渲染通道
    Recording,
    /// 正在录制，渲染通道已打开
    RecordingInPass,
    /// 录制结束，可以提交
    Closed,
}

impl CommandListState {
    /// 是否允许录制命令
    pub fn is_recording(&self) -> bool {
        matches!(
            self,
            CommandListState::Recording | CommandListState::RecordingInPass
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandListState::Initial => "Initial",
            CommandListState::Recording => "Recording",
            CommandListState::RecordingInPass => "RecordingInPass",
            CommandListState::Closed => "Closed",
        }
    }
}

impl fmt::Display for CommandListState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 命令列表
pub struct CommandList {
    device: Arc<dyn DeviceApi>,
    queue_type: QueueType,
    config: CommandListConfig,
    state: CommandListState,
    command_buffer: Option<CommandBuffer>,

    // 渲染目标与渲染通道
    targets: RenderTargetSet,
    framebuffer_extent: vk::Extent2D,
    // 当前打开的渲染通道的渲染区域
    pass_extent: Option<vk::Extent2D>,
    render_passes: Vec<vk::RenderPass>,
    framebuffers: Vec<vk::Framebuffer>,

    // 着色器与管线
    shaders: ShaderSet,
    compute_pipeline: Option<ComputePipeline>,
    retired_pipelines: Vec<ComputePipeline>,
    bind_point: vk::PipelineBindPoint,

    descriptors: DescriptorArena,
    event_depth: u32,
}

impl CommandList {
    /// 为指定队列类型创建命令列表
    ///
    /// 不会立即分配命令缓冲，第一次 `reset_with_allocator` 时才获取。
    pub fn new(device: Arc<dyn DeviceApi>, queue_type: QueueType, config: &Config) -> Self {
        let descriptors = DescriptorArena::new(device.clone(), &config.descriptors);
        let framebuffer_extent = vk::Extent2D {
            width: config.command_list.framebuffer_width,
            height: config.command_list.framebuffer_height,
        };

        debug!(queue = %queue_type, "Command list created");

        Self {
            device,
            queue_type,
            config: config.command_list.clone(),
            state: CommandListState::Initial,
            command_buffer: None,
            targets: RenderTargetSet::default(),
            framebuffer_extent,
            pass_extent: None,
            render_passes: Vec::new(),
            framebuffers: Vec::new(),
            shaders: ShaderSet::default(),
            compute_pipeline: None,
            retired_pipelines: Vec::new(),
            bind_point: default_bind_point(queue_type),
            descriptors,
            event_depth: 0,
        }
    }

    /// 当前状态
    pub fn state(&self) -> CommandListState {
        self.state
    }

    /// 队列类型
    pub fn queue_type(&self) -> QueueType {
        self.queue_type
    }

    /// 当前持有的命令缓冲（用于提交和查询）
    pub fn command_buffer(&self) -> Option<&CommandBuffer> {
        self.command_buffer.as_ref()
    }

    /// 当前绑定的渲染目标
    pub fn render_targets(&self) -> &RenderTargetSet {
        &self.targets
    }

    /// 合成帧缓冲使用的尺寸
    pub fn framebuffer_extent(&self) -> vk::Extent2D {
        self.framebuffer_extent
    }

    /// 覆盖合成帧缓冲的尺寸，对之后的 `set_render_targets` 生效
    ///
    /// 已经打开的渲染通道保持原来的渲染区域。
    pub fn set_framebuffer_extent(&mut self, extent: vk::Extent2D) {
        if extent.width == 0 || extent.height == 0 {
            warn!(
                width = extent.width,
                height = extent.height,
                "Ignoring zero-sized framebuffer extent"
            );
            return;
        }
        self.framebuffer_extent = extent;
    }

    /// 某个阶段当前记录的着色器
    pub fn shader(&self, stage: ShaderStage) -> Option<vk::ShaderModule> {
        self.shaders.get(stage)
    }

    /// 当前由命令列表构建的计算管线
    pub fn compute_pipeline(&self) -> Option<vk::Pipeline> {
        self.compute_pipeline.map(|p| p.pipeline)
    }

    /// 每个绑定类别的描述符池使用情况
    pub fn descriptor_stats(&self) -> Vec<DescriptorPoolStats> {
        self.descriptors.all_stats()
    }

    // ---- 状态守卫 ----

    fn violation(&self, operation: &'static str, reason: &str) -> Result<()> {
        if self.config.strict_state_checks {
            Err(GraphicsError::InvalidState {
                operation,
                state: format!("{} ({})", self.state, reason),
            }
            .into())
        } else {
            warn!(operation, state = %self.state, reason, "Command ignored");
            Ok(())
        }
    }

    /// 处于录制状态时返回命令缓冲句柄，否则按守卫规则处理
    fn recording(&self, operation: &'static str) -> Result<Option<vk::CommandBuffer>> {
        match (&self.command_buffer, self.state.is_recording()) {
            (Some(buffer), true) => Ok(Some(buffer.handle())),
            _ => self.violation(operation, "not recording").map(|_| None),
        }
    }

    // ---- 生命周期 ----

    /// 从分配器获取（或复用）命令缓冲并开始录制
    ///
    /// 如果当前持有的命令缓冲来自同一个分配器则直接复用。
    /// 之前创建的渲染通道、帧缓冲和被替换的管线在这里销毁，
    /// 调用方需保证它们不再被 GPU 使用。
    pub fn reset_with_allocator(&mut self, allocator: &Arc<CommandAllocator>) -> Result<()> {
        if allocator.queue_type() != self.queue_type {
            return self.violation("reset_with_allocator", "allocator queue type mismatch");
        }

        let reuse = self
            .command_buffer
            .as_ref()
            .map_or(false, |buffer| Arc::ptr_eq(buffer.allocator(), allocator));

        if !reuse {
            let buffer = allocator.allocate()?;
            // 旧缓冲在这里归还给它的池
            self.command_buffer = Some(buffer);
            self.state = CommandListState::Initial;
        }

        self.restart()
    }

    /// 重新开始录制已经持有的命令缓冲
    pub fn reset(&mut self) -> Result<()> {
        if self.command_buffer.is_none() {
            return self.violation("reset", "no command buffer acquired");
        }
        self.restart()
    }

    fn restart(&mut self) -> Result<()> {
        let was_recording = self.state.is_recording();
        self.release_retired();
        if let Some(pipeline) = self.compute_pipeline.take() {
            self.retired_pipelines.push(pipeline);
        }
        self.shaders.clear();
        self.targets = RenderTargetSet::default();
        self.pass_extent = None;
        self.event_depth = 0;
        self.bind_point = default_bind_point(self.queue_type);
        self.state = CommandListState::Initial;

        let buffer = match self.command_buffer.as_mut() {
            Some(buffer) => buffer,
            None => return Ok(()),
        };

        if was_recording {
            debug!("Discarding unfinished recording");
            buffer.reset()?;
        }
        buffer.begin()?;

        self.state = CommandListState::Recording;
        trace!(queue = %self.queue_type, "Command list recording");
        Ok(())
    }

    /// 结束录制
    ///
    /// 打开的渲染通道会先被结束。即使结束命令缓冲失败，状态也会变为 Closed。
    pub fn close(&mut self) -> Result<()> {
        if !self.state.is_recording() {
            if self.state == CommandListState::Initial {
                debug!("Closing a command list that never started recording");
            }
            self.state = CommandListState::Closed;
            return Ok(());
        }

        if let Some(handle) = self.command_buffer.as_ref().map(CommandBuffer::handle) {
            self.end_pass(handle);
        }
        if self.event_depth > 0 {
            warn!(open_events = self.event_depth, "Closing with unbalanced debug events");
        }

        self.state = CommandListState::Closed;
        match self.command_buffer.as_mut() {
            Some(buffer) => buffer.end(),
            None => Ok(()),
        }
    }

    fn end_pass(&mut self, command_buffer: vk::CommandBuffer) {
        if self.state == CommandListState::RecordingInPass {
            self.device.cmd_end_render_pass(command_buffer);
            self.state = CommandListState::Recording;
        }
        self.pass_extent = None;
    }

    /// 销毁上一轮录制留下的对象
    fn release_retired(&mut self) {
        for pipeline in self.retired_pipelines.drain(..) {
            pipeline.destroy(self.device.as_ref());
        }
        for framebuffer in self.framebuffers.drain(..) {
            self.device.destroy_framebuffer(framebuffer);
        }
        for render_pass in self.render_passes.drain(..) {
            self.device.destroy_render_pass(render_pass);
        }
    }

    // ---- 调试标签 ----

    /// 开始一个调试区段
    pub fn begin_event(&mut self, name: &str) -> Result<()> {
        let Some(cmd) = self.recording("begin_event")? else {
            return Ok(());
        };

        self.event_depth += 1;
        if self.device.supports_debug_labels() {
            let label = CString::new(name.replace('\0', "")).unwrap_or_default();
            self.device
                .cmd_begin_debug_label(cmd, &label, EVENT_LABEL_COLOR);
        }
        Ok(())
    }

    /// 结束最近的调试区段
    pub fn end_event(&mut self) -> Result<()> {
        let Some(cmd) = self.recording("end_event")? else {
            return Ok(());
        };

        if self.event_depth == 0 {
            warn!("end_event without a matching begin_event");
            return Ok(());
        }

        self.event_depth -= 1;
        if self.device.supports_debug_labels() {
            self.device.cmd_end_debug_label(cmd);
        }
        Ok(())
    }

    // ---- 资源屏障 ----

    /// 记录一次资源状态转换
    pub fn resource_barrier(
        &mut self,
        resource: &Resource,
        before: ResourceState,
        after: ResourceState,
    ) -> Result<()> {
        self.resource_barriers(&[(*resource, before, after)])
    }

    /// 在一次屏障调用中记录多个资源状态转换
    pub fn resource_barriers(
        &mut self,
        transitions: &[(Resource, ResourceState, ResourceState)],
    ) -> Result<()> {
        let Some(cmd) = self.recording("resource_barrier")? else {
            return Ok(());
        };
        if transitions.is_empty() {
            return Ok(());
        }
        if transitions
            .iter()
            .any(|(_, _, after)| *after == ResourceState::Undefined)
        {
            return self.violation("resource_barrier", "Undefined is not a valid target state");
        }

        let mut buffer_barriers = Vec::new();
        let mut image_barriers = Vec::new();
        for (resource, before, after) in transitions {
            match ResourceStateConverter::build_barrier(resource, *before, *after) {
                ResourceBarrier::Buffer(barrier) => buffer_barriers.push(barrier),
                ResourceBarrier::Image(barrier) => image_barriers.push(barrier),
            }
        }

        self.device.cmd_pipeline_barrier(
            cmd,
            BARRIER_STAGE,
            BARRIER_STAGE,
            &buffer_barriers,
            &image_barriers,
        );
        Ok(())
    }

    // ---- 渲染目标 ----

    /// 绑定渲染目标并打开渲染通道
    ///
    /// 已经打开的渲染通道会先被结束。没有任何附件时只结束旧通道。
    /// 渲染通道或帧缓冲创建失败时返回错误，此时没有打开的通道。
    ///
    /// # 参数
    ///
    /// * `colors` - 颜色附件，顺序即附件索引
    /// * `depth` - 可选的深度模板附件
    pub fn set_render_targets(
        &mut self,
        colors: &[RenderTargetView],
        depth: Option<&DepthStencilView>,
    ) -> Result<()> {
        let Some(cmd) = self.recording("set_render_targets")? else {
            return Ok(());
        };
        if !self.queue_type.supports_graphics() {
            return self.violation("set_render_targets", "queue does not support graphics");
        }

        self.end_pass(cmd);
        self.targets = RenderTargetSet::new(colors, depth);
        if self.targets.is_empty() {
            return Ok(());
        }

        let layout = self.targets.layout();
        let render_pass = self.device.create_render_pass(&layout).map_err(|e| {
            error!(
                attachments = self.targets.attachment_count(),
                error = ?e,
                "Failed to create render pass"
            );
            RhiError::creation("render pass", e)
        })?;

        let extent = self.framebuffer_extent;
        let views = self.targets.image_views();
        let framebuffer = match self.device.create_framebuffer(render_pass, &views, extent) {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                error!(
                    width = extent.width,
                    height = extent.height,
                    error = ?e,
                    "Failed to create framebuffer"
                );
                self.device.destroy_render_pass(render_pass);
                return Err(RhiError::creation("framebuffer", e));
            }
        };

        self.render_passes.push(render_pass);
        self.framebuffers.push(framebuffer);

        self.device
            .cmd_begin_render_pass(cmd, render_pass, framebuffer, extent);
        self.state = CommandListState::RecordingInPass;
        self.pass_extent = Some(extent);
        trace!(
            colors = self.targets.colors.len(),
            depth = self.targets.depth.is_some(),
            "Render pass begun"
        );
        Ok(())
    }

    /// 结束当前渲染通道
    pub fn end_render_pass(&mut self) -> Result<()> {
        let Some(cmd) = self.recording("end_render_pass")? else {
            return Ok(());
        };
        self.end_pass(cmd);
        Ok(())
    }

    // ---- 清除 ----

    /// 清除渲染目标
    ///
    /// 渲染通道外直接清除图像，图像需已处于 CopyDest 状态；
    /// 渲染通道内清除对应的附件，视图必须是当前绑定的颜色附件。
    pub fn clear_render_target_view(&mut self, rtv: &RenderTargetView, color: [f32; 4]) -> Result<()> {
        let Some(cmd) = self.recording("clear_render_target_view")? else {
            return Ok(());
        };

        if self.state == CommandListState::RecordingInPass {
            let Some(index) = self.targets.color_index(rtv.view) else {
                return self.violation(
                    "clear_render_target_view",
                    "view is not bound to the open render pass",
                );
            };
            let attachment = vk::ClearAttachment {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                color_attachment: index,
                clear_value: vk::ClearValue {
                    color: vk::ClearColorValue { float32: color },
                },
            };
            self.device
                .cmd_clear_attachments(cmd, &[attachment], self.clear_rect());
        } else {
            self.device.cmd_clear_color_image(
                cmd,
                rtv.image.handle,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                color,
                rtv.image.full_range(),
            );
        }
        Ok(())
    }

    /// 清除深度模板
    ///
    /// `flags` 中图像不具备的分量会被忽略。
    pub fn clear_depth_stencil_view(
        &mut self,
        dsv: &DepthStencilView,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<()> {
        let Some(cmd) = self.recording("clear_depth_stencil_view")? else {
            return Ok(());
        };

        let aspect_mask = flags.aspect_mask(&dsv.image);
        if aspect_mask.is_empty() {
            debug!(format = ?dsv.image.format, "Depth stencil clear has nothing to clear");
            return Ok(());
        }

        if self.state == CommandListState::RecordingInPass {
            if !self.targets.is_depth(dsv.view) {
                return self.violation(
                    "clear_depth_stencil_view",
                    "view is not bound to the open render pass",
                );
            }
            let attachment = vk::ClearAttachment {
                aspect_mask,
                color_attachment: 0,
                clear_value: vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue {
                        depth,
                        stencil: u32::from(stencil),
                    },
                },
            };
            self.device
                .cmd_clear_attachments(cmd, &[attachment], self.clear_rect());
        } else {
            let range = vk::ImageSubresourceRange {
                aspect_mask,
                ..dsv.image.full_range()
            };
            self.device.cmd_clear_depth_stencil_image(
                cmd,
                dsv.image.handle,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                depth,
                u32::from(stencil),
                range,
            );
        }
        Ok(())
    }

    fn clear_rect(&self) -> vk::ClearRect {
        vk::ClearRect {
            rect: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.pass_extent.unwrap_or(self.framebuffer_extent),
            },
            base_array_layer: 0,
            layer_count: 1,
        }
    }

    // ---- 光栅化状态 ----

    pub fn set_viewport(&mut self, viewport: vk::Viewport) -> Result<()> {
        let Some(cmd) = self.recording("set_viewport")? else {
            return Ok(());
        };
        self.device.cmd_set_viewport(cmd, viewport);
        Ok(())
    }

    pub fn set_scissor_rect(&mut self, rect: vk::Rect2D) -> Result<()> {
        let Some(cmd) = self.recording("set_scissor_rect")? else {
            return Ok(());
        };
        self.device.cmd_set_scissor(cmd, rect);
        Ok(())
    }

    // ---- 输入装配 ----

    /// 从 `start_slot` 开始绑定一组顶点缓冲
    pub fn set_vertex_buffers(&mut self, start_slot: u32, views: &[VertexBufferView]) -> Result<()> {
        let Some(cmd) = self.recording("set_vertex_buffers")? else {
            return Ok(());
        };
        if views.is_empty() {
            return Ok(());
        }

        let buffers: Vec<vk::Buffer> = views.iter().map(|v| v.buffer.handle).collect();
        let offsets: Vec<vk::DeviceSize> = views.iter().map(|v| v.offset).collect();
        self.device
            .cmd_bind_vertex_buffers(cmd, start_slot, &buffers, &offsets);
        Ok(())
    }

    pub fn set_index_buffer(&mut self, view: &IndexBufferView) -> Result<()> {
        let Some(cmd) = self.recording("set_index_buffer")? else {
            return Ok(());
        };
        self.device
            .cmd_bind_index_buffer(cmd, view.buffer.handle, view.offset, view.format.to_vk());
        Ok(())
    }

    // ---- 绘制与派发 ----

    pub fn draw(&mut self, vertex_count: u32, start_vertex: u32) -> Result<()> {
        self.draw_instanced(vertex_count, 1, start_vertex, 0)
    }

    pub fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32) -> Result<()> {
        self.draw_indexed_instanced(index_count, 1, start_index, base_vertex, 0)
    }

    pub fn draw_instanced(
        &mut self,
        vertex_count_per_instance: u32,
        instance_count: u32,
        start_vertex: u32,
        start_instance: u32,
    ) -> Result<()> {
        let Some(cmd) = self.recording("draw")? else {
            return Ok(());
        };
        self.device.cmd_draw(
            cmd,
            vertex_count_per_instance,
            instance_count,
            start_vertex,
            start_instance,
        );
        Ok(())
    }

    pub fn draw_indexed_instanced(
        &mut self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index: u32,
        base_vertex: i32,
        start_instance: u32,
    ) -> Result<()> {
        let Some(cmd) = self.recording("draw_indexed")? else {
            return Ok(());
        };
        self.device.cmd_draw_indexed(
            cmd,
            index_count_per_instance,
            instance_count,
            start_index,
            base_vertex,
            start_instance,
        );
        Ok(())
    }

    /// 派发计算工作组
    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        let Some(cmd) = self.recording("dispatch")? else {
            return Ok(());
        };
        if !self.queue_type.supports_compute() {
            return self.violation("dispatch", "queue does not support compute");
        }
        self.device.cmd_dispatch(cmd, x, y, z);
        Ok(())
    }

    // ---- 复制 ----

    /// 缓冲之间复制 `size` 字节
    pub fn copy_buffer(
        &mut self,
        dst: &BufferResource,
        dst_offset: vk::DeviceSize,
        src: &BufferResource,
        src_offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<()> {
        let Some(cmd) = self.recording("copy_buffer")? else {
            return Ok(());
        };
        let region = vk::BufferCopy {
            src_offset,
            dst_offset,
            size,
        };
        self.device.cmd_copy_buffer(cmd, src.handle, dst.handle, region);
        Ok(())
    }

    /// 复制整张图像的第 0 级 mip
    ///
    /// 源图像需处于 CopySource 状态，目标图像需处于 CopyDest 状态。
    pub fn copy_texture(&mut self, dst: &ImageResource, src: &ImageResource) -> Result<()> {
        let Some(cmd) = self.recording("copy_texture")? else {
            return Ok(());
        };
        let region = vk::ImageCopy {
            src_subresource: src.subresource_layers(0),
            src_offset: vk::Offset3D::default(),
            dst_subresource: dst.subresource_layers(0),
            dst_offset: vk::Offset3D::default(),
            extent: vk::Extent3D {
                width: src.width.min(dst.width),
                height: src.height.min(dst.height),
                depth: src.depth.min(dst.depth),
            },
        };
        self.device.cmd_copy_image(cmd, src.handle, dst.handle, region);
        Ok(())
    }

    /// 把紧密排列的像素数据从缓冲复制到图像的第 0 级 mip
    pub fn copy_buffer_to_texture(
        &mut self,
        dst: &ImageResource,
        src: &BufferResource,
        src_offset: vk::DeviceSize,
    ) -> Result<()> {
        let Some(cmd) = self.recording("copy_buffer_to_texture")? else {
            return Ok(());
        };
        let region = vk::BufferImageCopy {
            buffer_offset: src_offset,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: dst.subresource_layers(0),
            image_offset: vk::Offset3D::default(),
            image_extent: dst.extent(),
        };
        self.device
            .cmd_copy_buffer_to_image(cmd, src.handle, dst.handle, region);
        Ok(())
    }

    // ---- 着色器与管线 ----

    /// 设置某个阶段的着色器
    ///
    /// 计算着色器会立即构建新的计算管线并绑定。构建失败时返回错误，
    /// 之前的管线保持绑定；成功时旧管线在下一次 reset 时销毁。
    pub fn set_shader(&mut self, stage: ShaderStage, module: vk::ShaderModule) -> Result<()> {
        let Some(cmd) = self.recording("set_shader")? else {
            return Ok(());
        };

        if stage != ShaderStage::Compute {
            self.shaders.set(stage, module);
            return Ok(());
        }
        if !self.queue_type.supports_compute() {
            return self.violation("set_shader", "queue does not support compute");
        }

        let set_layouts = self.descriptors.all_set_layouts()?;
        let pipeline = ComputePipeline::build(&self.device, &set_layouts, module)?;

        self.shaders.set(stage, module);
        self.device
            .cmd_bind_pipeline(cmd, vk::PipelineBindPoint::COMPUTE, pipeline.pipeline);
        self.bind_point = vk::PipelineBindPoint::COMPUTE;
        if let Some(previous) = self.compute_pipeline.replace(pipeline) {
            self.retired_pipelines.push(previous);
        }
        Ok(())
    }

    /// 绑定外部构建的管线
    ///
    /// 之后的描述符绑定使用该管线的绑定点。
    pub fn set_pipeline_state(&mut self, pipeline: vk::Pipeline, kind: PipelineKind) -> Result<()> {
        let Some(cmd) = self.recording("set_pipeline_state")? else {
            return Ok(());
        };
        let supported = match kind {
            PipelineKind::Graphics => self.queue_type.supports_graphics(),
            PipelineKind::Compute => self.queue_type.supports_compute(),
        };
        if !supported {
            return self.violation("set_pipeline_state", "pipeline kind not supported by queue");
        }

        self.device.cmd_bind_pipeline(cmd, kind.bind_point(), pipeline);
        self.bind_point = kind.bind_point();
        Ok(())
    }

    // ---- 描述符绑定 ----

    /// 绑定常量缓冲（set 0）
    pub fn set_constant_buffer(&mut self, cbv: &ConstantBufferView) -> Result<()> {
        let write = DescriptorWrite::UniformBuffer {
            buffer: cbv.buffer.handle,
            offset: cbv.offset,
            range: cbv.size,
        };
        self.bind_descriptor("set_constant_buffer", BindingCategory::ConstantBuffer, write)
    }

    /// 绑定只读着色资源（set 1）
    ///
    /// 图像需处于 ShaderResource 状态。
    pub fn set_shader_resource(&mut self, srv: &ShaderResourceView) -> Result<()> {
        let write = DescriptorWrite::SampledImage {
            view: srv.view,
            layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        };
        self.bind_descriptor("set_shader_resource", BindingCategory::ShaderResource, write)
    }

    /// 绑定可读写资源（set 2）
    ///
    /// 图像需处于 UnorderedAccess 状态。
    pub fn set_unordered_access_view(&mut self, uav: &UnorderedAccessView) -> Result<()> {
        let write = DescriptorWrite::StorageImage {
            view: uav.view,
            layout: vk::ImageLayout::GENERAL,
        };
        self.bind_descriptor(
            "set_unordered_access_view",
            BindingCategory::UnorderedAccess,
            write,
        )
    }

    fn bind_descriptor(
        &mut self,
        operation: &'static str,
        category: BindingCategory,
        write: DescriptorWrite,
    ) -> Result<()> {
        let Some(cmd) = self.recording(operation)? else {
            return Ok(());
        };

        let layout = self.descriptors.pipeline_layout()?;
        let set = self.descriptors.allocate(category, &write)?;
        self.device
            .cmd_bind_descriptor_set(cmd, self.bind_point, layout, category.set_index(), set);
        Ok(())
    }
}

fn default_bind_point(queue_type: QueueType) -> vk::PipelineBindPoint {
    if queue_type.supports_graphics() {
        vk::PipelineBindPoint::GRAPHICS
    } else {
        vk::PipelineBindPoint::COMPUTE
    }
}

impl Drop for CommandList {
    /// 销毁顺序：管线与管线布局 → 描述符池 → 描述符集布局 → 帧缓冲 → 渲染通道 → 命令缓冲
    fn drop(&mut self) {
        if let Some(pipeline) = self.compute_pipeline.take() {
            pipeline.destroy(self.device.as_ref());
        }
        for pipeline in self.retired_pipelines.drain(..) {
            pipeline.destroy(self.device.as_ref());
        }
        self.descriptors.destroy();
        for framebuffer in self.framebuffers.drain(..) {
            self.device.destroy_framebuffer(framebuffer);
        }
        for render_pass in self.render_passes.drain(..) {
            self.device.destroy_render_pass(render_pass);
        }
        self.command_buffer = None;
    }
}
