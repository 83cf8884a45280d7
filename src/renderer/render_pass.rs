//! 渲染通道合成
//!
//! Vulkan 需要显式的 RenderPass 和 Framebuffer，而上层只给出一组渲染目标视图。
//! 这里根据绑定的视图合成渲染通道描述：
//!
//! - 每个颜色附件 load = LOAD、store = STORE，布局保持 COLOR_ATTACHMENT_OPTIMAL
//! - 深度附件的深度与模板分量都是 LOAD / STORE，布局 DEPTH_STENCIL_ATTACHMENT_OPTIMAL
//! - 只有一个子通道，引用全部颜色附件和可选的深度附件
//! - 一个 EXTERNAL → 0 的依赖
//!
//! 调用方需要先把资源转换到 RenderTarget / DepthWrite 状态。

use ash::vk;

use crate::gfx::RenderPassLayout;

use super::resource::{DepthStencilView, RenderTargetView};

/// 当前绑定的渲染目标
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderTargetSet {
    /// 颜色附件，顺序即附件索引
    pub colors: Vec<RenderTargetView>,
    /// 深度模板附件
    pub depth: Option<DepthStencilView>,
}

impl RenderTargetSet {
    pub fn new(colors: &[RenderTargetView], depth: Option<&DepthStencilView>) -> Self {
        Self {
            colors: colors.to_vec(),
            depth: depth.copied(),
        }
    }

    /// 是否没有任何附件
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.depth.is_none()
    }

    /// 附件总数
    pub fn attachment_count(&self) -> usize {
        self.colors.len() + usize::from(self.depth.is_some())
    }

    /// Framebuffer 使用的图像视图，颜色在前，深度在最后
    pub fn image_views(&self) -> Vec<vk::ImageView> {
        self.colors
            .iter()
            .map(|rtv| rtv.view)
            .chain(self.depth.iter().map(|dsv| dsv.view))
            .collect()
    }

    /// 某个颜色视图在子通道中的附件索引
    pub fn color_index(&self, view: vk::ImageView) -> Option<u32> {
        self.colors
            .iter()
            .position(|rtv| rtv.view == view)
            .map(|index| index as u32)
    }

    /// 深度视图是否就是当前绑定的深度附件
    pub fn is_depth(&self, view: vk::ImageView) -> bool {
        self.depth.map_or(false, |dsv| dsv.view == view)
    }

    /// 合成渲染通道描述
    pub fn layout(&self) -> RenderPassLayout {
        let mut attachments = Vec::with_capacity(self.attachment_count());
        let mut color_refs = Vec::with_capacity(self.colors.len());

        for (index, rtv) in self.colors.iter().enumerate() {
            attachments.push(
                vk::AttachmentDescription::builder()
                    .format(rtv.image.format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::LOAD)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .build(),
            );
            color_refs.push(vk::AttachmentReference {
                attachment: index as u32,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            });
        }

        let depth_ref = self.depth.map(|dsv| {
            attachments.push(
                vk::AttachmentDescription::builder()
                    .format(dsv.image.format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::LOAD)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::LOAD)
                    .stencil_store_op(vk::AttachmentStoreOp::STORE)
                    .initial_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                    .build(),
            );
            vk::AttachmentReference {
                attachment: self.colors.len() as u32,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            }
        });

        let mut stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
        let mut dst_access = vk::AccessFlags::COLOR_ATTACHMENT_WRITE;
        if depth_ref.is_some() {
            stages |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
            dst_access |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
        }

        let dependency = vk::SubpassDependency::builder()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stages)
            .dst_stage_mask(stages)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(dst_access)
            .build();

        RenderPassLayout {
            attachments,
            color_refs,
            depth_ref,
            dependency,
        }
    }
}
