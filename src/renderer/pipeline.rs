//! 着色器阶段与计算管线
//!
//! 着色器模块由外部编译和创建，这里只按阶段记录句柄；
//! 设置计算着色器时立即构建对应的计算管线。

use std::collections::HashMap;
use std::ffi::CStr;
use std::fmt;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error};

use crate::core::error::{Result, RhiError};
use crate::gfx::DeviceApi;

/// 着色器入口函数名
pub const SHADER_ENTRY_POINT: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") };

/// 着色器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
    Compute,
}

impl ShaderStage {
    /// 对应的 Vulkan 阶段标志
    pub fn to_vk(self) -> vk::ShaderStageFlags {
        match self {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Hull => vk::ShaderStageFlags::TESSELLATION_CONTROL,
            ShaderStage::Domain => vk::ShaderStageFlags::TESSELLATION_EVALUATION,
            ShaderStage::Geometry => vk::ShaderStageFlags::GEOMETRY,
            ShaderStage::Pixel => vk::ShaderStageFlags::FRAGMENT,
            ShaderStage::Compute => vk::ShaderStageFlags::COMPUTE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "Vertex",
            ShaderStage::Hull => "Hull",
            ShaderStage::Domain => "Domain",
            ShaderStage::Geometry => "Geometry",
            ShaderStage::Pixel => "Pixel",
            ShaderStage::Compute => "Compute",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 管线种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Graphics,
    Compute,
}

impl PipelineKind {
    /// 对应的绑定点
    pub fn bind_point(self) -> vk::PipelineBindPoint {
        match self {
            PipelineKind::Graphics => vk::PipelineBindPoint::GRAPHICS,
            PipelineKind::Compute => vk::PipelineBindPoint::COMPUTE,
        }
    }
}

/// 按阶段记录的着色器模块
#[derive(Debug, Clone, Default)]
pub struct ShaderSet {
    modules: HashMap<ShaderStage, vk::ShaderModule>,
}

impl ShaderSet {
    pub fn set(&mut self, stage: ShaderStage, module: vk::ShaderModule) {
        self.modules.insert(stage, module);
    }

    pub fn get(&self, stage: ShaderStage) -> Option<vk::ShaderModule> {
        self.modules.get(&stage).copied()
    }

    pub fn clear(&mut self) {
        self.modules.clear();
    }
}

/// 由命令列表构建并拥有的计算管线
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputePipeline {
    pub layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
}

impl ComputePipeline {
    /// 构建管线布局和计算管线
    ///
    /// # 参数
    ///
    /// * `device` - 逻辑设备
    /// * `set_layouts` - 按 set 索引排列的描述符集布局
    /// * `module` - 计算着色器模块
    ///
    /// # 返回值
    ///
    /// 任何一步失败都会清理已经创建的对象并返回错误
    pub fn build(
        device: &Arc<dyn DeviceApi>,
        set_layouts: &[vk::DescriptorSetLayout],
        module: vk::ShaderModule,
    ) -> Result<Self> {
        let layout = device.create_pipeline_layout(set_layouts).map_err(|e| {
            error!(error = ?e, "Failed to create compute pipeline layout");
            RhiError::creation("compute pipeline layout", e)
        })?;

        let pipeline = match device.create_compute_pipeline(layout, module, SHADER_ENTRY_POINT) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                error!(error = ?e, "Failed to create compute pipeline");
                device.destroy_pipeline_layout(layout);
                return Err(RhiError::creation("compute pipeline", e));
            }
        };

        debug!(?pipeline, "Compute pipeline created");
        Ok(Self { layout, pipeline })
    }

    /// 销毁管线和布局
    pub fn destroy(self, device: &dyn DeviceApi) {
        device.destroy_pipeline(self.pipeline);
        device.destroy_pipeline_layout(self.layout);
    }
}
