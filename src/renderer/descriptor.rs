//! 描述符管理模块
//!
//! 按绑定类别管理描述符集布局、描述符池和描述符集。
//!
//! # 绑定类别
//!
//! | 类别 | Set 索引 | Vulkan 描述符类型 |
//! |------|---------|------------------|
//! | ConstantBuffer (CBV) | 0 | Uniform Buffer |
//! | ShaderResource (SRV) | 1 | Sampled Image |
//! | UnorderedAccess (UAV) | 2 | Storage Image |
//!
//! 每个类别的布局和池都在第一次使用时创建。每次绑定都分配一个新的描述符集，
//! 描述符集不单独释放，只随池一起在 `DescriptorArena` 销毁时回收。
//! 这与命令列表短暂的逐帧生命周期相匹配，长期复用一个列表会逐渐耗尽池容量。

use std::fmt;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error};

use crate::core::config::DescriptorConfig;
use crate::core::error::{Result, RhiError};
use crate::gfx::{DescriptorWrite, DeviceApi};

/// 描述符绑定类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingCategory {
    /// 常量缓冲视图 (CBV)
    ConstantBuffer,
    /// 着色资源视图 (SRV)
    ShaderResource,
    /// 无序访问视图 (UAV)
    UnorderedAccess,
}

impl BindingCategory {
    /// 全部类别，按 set 索引排序
    pub const ALL: [BindingCategory; 3] = [
        BindingCategory::ConstantBuffer,
        BindingCategory::ShaderResource,
        BindingCategory::UnorderedAccess,
    ];

    /// 管线布局中的 set 索引
    pub fn set_index(&self) -> u32 {
        match self {
            BindingCategory::ConstantBuffer => 0,
            BindingCategory::ShaderResource => 1,
            BindingCategory::UnorderedAccess => 2,
        }
    }

    /// 对应的 Vulkan 描述符类型
    pub fn descriptor_type(&self) -> vk::DescriptorType {
        match self {
            BindingCategory::ConstantBuffer => vk::DescriptorType::UNIFORM_BUFFER,
            BindingCategory::ShaderResource => vk::DescriptorType::SAMPLED_IMAGE,
            BindingCategory::UnorderedAccess => vk::DescriptorType::STORAGE_IMAGE,
        }
    }

    /// 获取类别名称
    pub fn name(&self) -> &'static str {
        match self {
            BindingCategory::ConstantBuffer => "CBV",
            BindingCategory::ShaderResource => "SRV",
            BindingCategory::UnorderedAccess => "UAV",
        }
    }

    fn slot(&self) -> usize {
        self.set_index() as usize
    }
}

impl fmt::Display for BindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 描述符池统计信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptorPoolStats {
    /// 绑定类别
    pub category: BindingCategory,
    /// 池容量（描述符集数量），池尚未创建时为 0
    pub capacity: u32,
    /// 已分配的描述符集数量
    pub used: u32,
    /// 剩余可分配数量
    pub available: u32,
    /// 使用率 (0.0 - 1.0)
    pub usage_ratio: f32,
}

impl DescriptorPoolStats {
    /// 创建新的统计信息
    pub fn new(category: BindingCategory, capacity: u32, used: u32) -> Self {
        let available = capacity.saturating_sub(used);
        let usage_ratio = if capacity > 0 {
            used as f32 / capacity as f32
        } else {
            0.0
        };

        Self {
            category,
            capacity,
            used,
            available,
            usage_ratio,
        }
    }
}

#[derive(Default)]
struct CategorySlot {
    layout: vk::DescriptorSetLayout,
    pool: vk::DescriptorPool,
    sets: Vec<vk::DescriptorSet>,
}

/// 描述符竞技场
///
/// 由 `CommandList` 独占，按类别持有布局、池和已分配的描述符集，
/// 以及一个包含全部三个 set 布局的管线布局（用于绑定描述符集）。
pub struct DescriptorArena {
    device: Arc<dyn DeviceApi>,
    max_sets: u32,
    descriptors_per_pool: u32,
    slots: [CategorySlot; 3],
    pipeline_layout: vk::PipelineLayout,
}

impl DescriptorArena {
    /// 创建空的竞技场，不立即创建任何 Vulkan 对象
    pub fn new(device: Arc<dyn DeviceApi>, config: &DescriptorConfig) -> Self {
        Self {
            device,
            max_sets: config.max_sets,
            descriptors_per_pool: config.descriptors_per_pool,
            slots: Default::default(),
            pipeline_layout: vk::PipelineLayout::null(),
        }
    }

    /// 获取（必要时创建）某个类别的描述符集布局
    ///
    /// 布局只有一个 binding 0，对所有着色器阶段可见。
    pub fn set_layout(&mut self, category: BindingCategory) -> Result<vk::DescriptorSetLayout> {
        let slot = &mut self.slots[category.slot()];
        if slot.layout != vk::DescriptorSetLayout::null() {
            return Ok(slot.layout);
        }

        let layout = self
            .device
            .create_descriptor_set_layout(category.descriptor_type(), vk::ShaderStageFlags::ALL)
            .map_err(|e| {
                error!(category = %category, error = ?e, "Failed to create descriptor set layout");
                RhiError::creation("descriptor set layout", e)
            })?;

        debug!(category = %category, "Descriptor set layout created");
        slot.layout = layout;
        Ok(layout)
    }

    /// 全部三个类别的布局，按 set 索引排序
    pub fn all_set_layouts(&mut self) -> Result<[vk::DescriptorSetLayout; 3]> {
        Ok([
            self.set_layout(BindingCategory::ConstantBuffer)?,
            self.set_layout(BindingCategory::ShaderResource)?,
            self.set_layout(BindingCategory::UnorderedAccess)?,
        ])
    }

    /// 获取（必要时创建）绑定描述符集使用的管线布局
    pub fn pipeline_layout(&mut self) -> Result<vk::PipelineLayout> {
        if self.pipeline_layout != vk::PipelineLayout::null() {
            return Ok(self.pipeline_layout);
        }

        let set_layouts = self.all_set_layouts()?;
        let layout = self
            .device
            .create_pipeline_layout(&set_layouts)
            .map_err(|e| {
                error!(error = ?e, "Failed to create descriptor binding pipeline layout");
                RhiError::creation("pipeline layout", e)
            })?;

        self.pipeline_layout = layout;
        Ok(layout)
    }

    fn pool(&mut self, category: BindingCategory) -> Result<vk::DescriptorPool> {
        let existing = self.slots[category.slot()].pool;
        if existing != vk::DescriptorPool::null() {
            return Ok(existing);
        }

        let sizes = [vk::DescriptorPoolSize {
            ty: category.descriptor_type(),
            descriptor_count: self.descriptors_per_pool,
        }];
        let pool = self
            .device
            .create_descriptor_pool(self.max_sets, &sizes)
            .map_err(|e| {
                error!(category = %category, error = ?e, "Failed to create descriptor pool");
                RhiError::creation("descriptor pool", e)
            })?;

        debug!(category = %category, max_sets = self.max_sets, "Descriptor pool created");
        self.slots[category.slot()].pool = pool;
        Ok(pool)
    }

    /// 分配一个新的描述符集并写入 binding 0
    ///
    /// # 参数
    ///
    /// * `category` - 绑定类别
    /// * `write` - 写入内容，其描述符类型必须与类别一致
    ///
    /// # 返回值
    ///
    /// 新分配的描述符集。即使内容与之前相同也不会复用。
    pub fn allocate(
        &mut self,
        category: BindingCategory,
        write: &DescriptorWrite,
    ) -> Result<vk::DescriptorSet> {
        debug_assert_eq!(write.descriptor_type(), category.descriptor_type());

        let layout = self.set_layout(category)?;
        let pool = self.pool(category)?;
        let set = self
            .device
            .allocate_descriptor_set(pool, layout)
            .map_err(|e| {
                error!(
                    category = %category,
                    allocated = self.slots[category.slot()].sets.len(),
                    error = ?e,
                    "Failed to allocate descriptor set"
                );
                RhiError::creation("descriptor set", e)
            })?;

        self.device.write_descriptor_set(set, 0, write);
        self.slots[category.slot()].sets.push(set);
        Ok(set)
    }

    /// 某个类别的统计信息
    pub fn stats(&self, category: BindingCategory) -> DescriptorPoolStats {
        let slot = &self.slots[category.slot()];
        let capacity = if slot.pool != vk::DescriptorPool::null() {
            self.max_sets
        } else {
            0
        };
        DescriptorPoolStats::new(category, capacity, slot.sets.len() as u32)
    }

    /// 所有类别的统计信息
    pub fn all_stats(&self) -> Vec<DescriptorPoolStats> {
        BindingCategory::ALL
            .iter()
            .map(|category| self.stats(*category))
            .collect()
    }

    /// 按固定顺序销毁所有对象：管线布局 → 描述符池 → 描述符集布局
    ///
    /// 可重复调用。
    pub fn destroy(&mut self) {
        if self.pipeline_layout != vk::PipelineLayout::null() {
            self.device.destroy_pipeline_layout(self.pipeline_layout);
            self.pipeline_layout = vk::PipelineLayout::null();
        }

        for slot in self.slots.iter_mut() {
            slot.sets.clear();
            if slot.pool != vk::DescriptorPool::null() {
                self.device.destroy_descriptor_pool(slot.pool);
                slot.pool = vk::DescriptorPool::null();
            }
        }

        for slot in self.slots.iter_mut() {
            if slot.layout != vk::DescriptorSetLayout::null() {
                self.device.destroy_descriptor_set_layout(slot.layout);
                slot.layout = vk::DescriptorSetLayout::null();
            }
        }
    }
}

impl Drop for DescriptorArena {
    fn drop(&mut self) {
        self.destroy();
    }
}
