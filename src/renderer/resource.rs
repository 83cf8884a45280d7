//! 资源与视图模块
//!
//! 命令录制核心不创建 GPU 资源，只消费外部已经创建好的句柄。
//! 本模块定义了这些句柄的带类型包装：
//!
//! - `Resource`：缓冲或图像的封闭枚举，用 `match` 分派，不需要运行时类型转换
//! - 各种视图：RTV、DSV、SRV、UAV、CBV、顶点/索引缓冲视图
//! - `ResourceState`：资源的逻辑状态，转换由调用方以 (before, after) 的形式给出
//!
//! # 设计原则
//!
//! - **类型安全**：视图只能绑定到对应的接口上，错误的组合在编译期就会被拒绝
//! - **不跟踪历史**：核心不记录资源当前处于哪个状态

use ash::vk;

/// 资源逻辑状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// 未知状态（内容可丢弃），只应作为转换的起点
    Undefined,
    /// 通用状态
    Common,
    /// 顶点缓冲
    VertexBuffer,
    /// 常量缓冲
    ConstantBuffer,
    /// 索引缓冲
    IndexBuffer,
    /// 渲染目标
    RenderTarget,
    /// 无序访问（着色器读写）
    UnorderedAccess,
    /// 深度写入
    DepthWrite,
    /// 深度只读
    DepthRead,
    /// 着色器资源（只读采样）
    ShaderResource,
    /// 复制目标
    CopyDest,
    /// 复制源
    CopySource,
    /// 呈现
    Present,
}

impl ResourceState {
    /// 全部状态
    pub const ALL: [ResourceState; 13] = [
        ResourceState::Undefined,
        ResourceState::Common,
        ResourceState::VertexBuffer,
        ResourceState::ConstantBuffer,
        ResourceState::IndexBuffer,
        ResourceState::RenderTarget,
        ResourceState::UnorderedAccess,
        ResourceState::DepthWrite,
        ResourceState::DepthRead,
        ResourceState::ShaderResource,
        ResourceState::CopyDest,
        ResourceState::CopySource,
        ResourceState::Present,
    ];
}

/// 图像维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageDimension {
    D1,
    D2,
    D3,
}

impl ImageDimension {
    /// 对应的 Vulkan 图像类型
    pub fn to_vk(self) -> vk::ImageType {
        match self {
            ImageDimension::D1 => vk::ImageType::TYPE_1D,
            ImageDimension::D2 => vk::ImageType::TYPE_2D,
            ImageDimension::D3 => vk::ImageType::TYPE_3D,
        }
    }
}

/// 外部创建的缓冲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferResource {
    /// 缓冲句柄
    pub handle: vk::Buffer,
    /// 大小（字节）
    pub size: vk::DeviceSize,
}

impl BufferResource {
    pub fn new(handle: vk::Buffer, size: vk::DeviceSize) -> Self {
        Self { handle, size }
    }
}

/// 外部创建的图像
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageResource {
    /// 图像句柄
    pub handle: vk::Image,
    /// 维度
    pub dimension: ImageDimension,
    /// 像素格式
    pub format: vk::Format,
    /// 宽度
    pub width: u32,
    /// 高度
    pub height: u32,
    /// 深度（3D 图像）
    pub depth: u32,
    /// Mip 等级数量
    pub mip_levels: u32,
    /// 数组层数
    pub array_layers: u32,
}

impl ImageResource {
    /// 创建单 mip、单层的 2D 图像描述
    pub fn new_2d(handle: vk::Image, format: vk::Format, width: u32, height: u32) -> Self {
        Self {
            handle,
            dimension: ImageDimension::D2,
            format,
            width,
            height,
            depth: 1,
            mip_levels: 1,
            array_layers: 1,
        }
    }

    /// 设置 mip 等级数量
    pub fn with_mip_levels(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels.max(1);
        self
    }

    /// 设置数组层数
    pub fn with_array_layers(mut self, array_layers: u32) -> Self {
        self.array_layers = array_layers.max(1);
        self
    }

    /// 第 0 级 mip 的尺寸
    pub fn extent(&self) -> vk::Extent3D {
        vk::Extent3D {
            width: self.width,
            height: self.height,
            depth: self.depth,
        }
    }

    /// 是否是深度格式
    pub fn is_depth(&self) -> bool {
        is_depth_format(self.format)
    }

    /// 按格式推导的图像 aspect
    pub fn aspect_mask(&self) -> vk::ImageAspectFlags {
        format_aspect(self.format)
    }

    /// 覆盖所有 mip 和数组层的子资源范围
    pub fn full_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect_mask(),
            base_mip_level: 0,
            level_count: self.mip_levels,
            base_array_layer: 0,
            layer_count: self.array_layers,
        }
    }

    /// 某个 mip 等级的全部数组层
    pub fn subresource_layers(&self, mip_level: u32) -> vk::ImageSubresourceLayers {
        vk::ImageSubresourceLayers {
            aspect_mask: self.aspect_mask(),
            mip_level,
            base_array_layer: 0,
            layer_count: self.array_layers,
        }
    }
}

/// 是否是深度（或深度模板）格式
pub fn is_depth_format(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D16_UNORM
            | vk::Format::X8_D24_UNORM_PACK32
            | vk::Format::D32_SFLOAT
            | vk::Format::D16_UNORM_S8_UINT
            | vk::Format::D24_UNORM_S8_UINT
            | vk::Format::D32_SFLOAT_S8_UINT
    )
}

/// 是否带模板分量
pub fn has_stencil(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::S8_UINT
            | vk::Format::D16_UNORM_S8_UINT
            | vk::Format::D24_UNORM_S8_UINT
            | vk::Format::D32_SFLOAT_S8_UINT
    )
}

fn format_aspect(format: vk::Format) -> vk::ImageAspectFlags {
    if format == vk::Format::S8_UINT {
        return vk::ImageAspectFlags::STENCIL;
    }
    if !is_depth_format(format) {
        return vk::ImageAspectFlags::COLOR;
    }
    if has_stencil(format) {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else {
        vk::ImageAspectFlags::DEPTH
    }
}

/// GPU 资源
///
/// 缓冲与图像的封闭枚举。需要区分种类的地方（屏障、复制）直接 `match`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Buffer(BufferResource),
    Image(ImageResource),
}

impl Resource {
    /// 资源名称，仅用于日志
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Buffer(_) => "buffer",
            Resource::Image(_) => "image",
        }
    }
}

impl From<BufferResource> for Resource {
    fn from(buffer: BufferResource) -> Self {
        Resource::Buffer(buffer)
    }
}

impl From<ImageResource> for Resource {
    fn from(image: ImageResource) -> Self {
        Resource::Image(image)
    }
}

/// 渲染目标视图 (RTV)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetView {
    pub view: vk::ImageView,
    pub image: ImageResource,
}

/// 深度模板视图 (DSV)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilView {
    pub view: vk::ImageView,
    pub image: ImageResource,
}

/// 着色资源视图 (SRV)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderResourceView {
    pub view: vk::ImageView,
    pub image: ImageResource,
}

/// 无序访问视图 (UAV)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnorderedAccessView {
    pub view: vk::ImageView,
    pub image: ImageResource,
}

/// 常量缓冲视图 (CBV)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBufferView {
    pub buffer: BufferResource,
    /// 起始偏移（字节）
    pub offset: vk::DeviceSize,
    /// 区间大小（字节）
    pub size: vk::DeviceSize,
}

impl ConstantBufferView {
    /// 覆盖整个缓冲的视图
    pub fn whole(buffer: BufferResource) -> Self {
        Self {
            buffer,
            offset: 0,
            size: buffer.size,
        }
    }
}

/// 顶点缓冲视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferView {
    pub buffer: BufferResource,
    pub offset: vk::DeviceSize,
    /// 顶点步长（字节），由管线的顶点输入描述决定，这里只做记录
    pub stride: u32,
}

/// 索引格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    /// 对应的 Vulkan 索引类型
    pub fn to_vk(self) -> vk::IndexType {
        match self {
            IndexFormat::U16 => vk::IndexType::UINT16,
            IndexFormat::U32 => vk::IndexType::UINT32,
        }
    }
}

/// 索引缓冲视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBufferView {
    pub buffer: BufferResource,
    pub offset: vk::DeviceSize,
    pub format: IndexFormat,
}

/// 深度模板清除标志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearFlags {
    pub depth: bool,
    pub stencil: bool,
}

impl ClearFlags {
    /// 只清除深度
    pub const DEPTH: ClearFlags = ClearFlags {
        depth: true,
        stencil: false,
    };
    /// 只清除模板
    pub const STENCIL: ClearFlags = ClearFlags {
        depth: false,
        stencil: true,
    };
    /// 同时清除深度和模板
    pub const DEPTH_STENCIL: ClearFlags = ClearFlags {
        depth: true,
        stencil: true,
    };

    /// 与图像实际拥有的分量取交集
    pub fn aspect_mask(&self, image: &ImageResource) -> vk::ImageAspectFlags {
        let mut requested = vk::ImageAspectFlags::empty();
        if self.depth {
            requested |= vk::ImageAspectFlags::DEPTH;
        }
        if self.stencil {
            requested |= vk::ImageAspectFlags::STENCIL;
        }
        requested & image.aspect_mask()
    }
}
