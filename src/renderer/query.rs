//! GPU 查询模块
//!
//! 三种查询对象，每个独占一个查询池：
//!
//! - `TimestampQuery`：两个时间戳之间的 GPU 耗时（毫秒）
//! - `OcclusionQuery`：通过深度测试的样本数
//! - `PipelineStatisticsQuery`：各管线阶段的调用计数
//!
//! `begin` / `end` 把命令录制到给定的命令缓冲中，`get_result` 阻塞到结果可用。
//! begin / end 是否配对由调用方保证。
//!
//! `begin` 会先重置查询池，而 `vkCmdResetQueryPool` 只能在渲染通道外录制。
//! 需要在渲染通道内开始查询时，先在通道外调用 `reset`，再在通道内调用 `begin_after_reset`。

use std::sync::Arc;

use ash::vk;
use bytemuck::{Pod, Zeroable};
use tracing::{debug, error};

use crate::core::error::{GraphicsError, Result, RhiError};
use crate::gfx::DeviceApi;

use super::command::{CommandBuffer, QueueType};

struct QueryPool {
    device: Arc<dyn DeviceApi>,
    pool: vk::QueryPool,
    query_count: u32,
}

impl QueryPool {
    fn new(
        device: Arc<dyn DeviceApi>,
        query_type: vk::QueryType,
        query_count: u32,
        statistics: vk::QueryPipelineStatisticFlags,
    ) -> Result<Self> {
        let pool = device
            .create_query_pool(query_type, query_count, statistics)
            .map_err(|e| {
                error!(?query_type, error = ?e, "Failed to create query pool");
                RhiError::creation("query pool", e)
            })?;
        debug!(?query_type, query_count, "Query pool created");

        Ok(Self {
            device,
            pool,
            query_count,
        })
    }

    fn reset(&self, command_buffer: &CommandBuffer) {
        self.device
            .cmd_reset_query_pool(command_buffer.handle(), self.pool, 0, self.query_count);
    }

    fn read(&self, values_per_query: u32, out: &mut [u64]) -> Result<()> {
        self.device
            .get_query_results(self.pool, self.query_count, values_per_query, out)
            .map_err(|e| {
                error!(error = ?e, "Failed to read query results");
                GraphicsError::CommandExecution(format!("Failed to read query results: {:?}", e))
                    .into()
            })
    }
}

impl Drop for QueryPool {
    fn drop(&mut self) {
        self.device.destroy_query_pool(self.pool);
    }
}

/// 时间戳查询
pub struct TimestampQuery {
    pool: QueryPool,
    timestamp_period: f32,
    valid_mask: u64,
}

impl TimestampQuery {
    /// 创建两个槽位的时间戳查询
    ///
    /// # 参数
    ///
    /// * `device` - 逻辑设备
    /// * `queue_type` - 写入时间戳的队列类型，决定计数器的有效位数
    pub fn new(device: Arc<dyn DeviceApi>, queue_type: QueueType) -> Result<Self> {
        let valid_bits = device.queue(queue_type).timestamp_valid_bits;
        if valid_bits == 0 {
            error!(queue = %queue_type, "Queue family does not support timestamps");
            return Err(GraphicsError::InvalidState {
                operation: "timestamp_query",
                state: format!("{} queue has no timestamp support", queue_type),
            }
            .into());
        }

        let timestamp_period = device.timestamp_period();
        let pool = QueryPool::new(
            device,
            vk::QueryType::TIMESTAMP,
            2,
            vk::QueryPipelineStatisticFlags::empty(),
        )?;
        Ok(Self {
            pool,
            timestamp_period,
            valid_mask: u64::MAX >> (64 - valid_bits.min(64)),
        })
    }

    /// 重置查询池，必须在渲染通道外录制
    pub fn reset(&self, command_buffer: &CommandBuffer) {
        self.pool.reset(command_buffer);
    }

    /// 重置并在管线顶部写入起始时间戳
    ///
    /// 只能在渲染通道外调用。
    pub fn begin(&self, command_buffer: &CommandBuffer) {
        self.pool.reset(command_buffer);
        self.begin_after_reset(command_buffer);
    }

    /// 在已经重置过的查询池上写入起始时间戳
    pub fn begin_after_reset(&self, command_buffer: &CommandBuffer) {
        self.pool.device.cmd_write_timestamp(
            command_buffer.handle(),
            vk::PipelineStageFlags::TOP_OF_PIPE,
            self.pool.pool,
            0,
        );
    }

    /// 在管线底部写入结束时间戳
    pub fn end(&self, command_buffer: &CommandBuffer) {
        self.pool.device.cmd_write_timestamp(
            command_buffer.handle(),
            vk::PipelineStageFlags::BOTTOM_OF_PIPE,
            self.pool.pool,
            1,
        );
    }

    /// 读回耗时（毫秒）
    ///
    /// 计数器只保留有效位。有效位不足 64 时，结束值小于起始值视为计数器回绕；
    /// 64 位计数器不会回绕，此时返回 0。
    pub fn get_result(&self) -> Result<f64> {
        let mut ticks = [0u64; 2];
        self.pool.read(1, &mut ticks)?;
        Ok(self.elapsed_ticks(ticks[0], ticks[1]) as f64 * f64::from(self.timestamp_period)
            / 1_000_000.0)
    }

    fn elapsed_ticks(&self, start: u64, end: u64) -> u64 {
        let (start, end) = (start & self.valid_mask, end & self.valid_mask);
        if end >= start {
            end - start
        } else if self.valid_mask != u64::MAX {
            end.wrapping_sub(start) & self.valid_mask
        } else {
            0
        }
    }
}

/// 遮挡查询
pub struct OcclusionQuery {
    pool: QueryPool,
    flags: vk::QueryControlFlags,
}

impl OcclusionQuery {
    /// 创建遮挡查询（允许驱动只返回是否有样本通过）
    pub fn new(device: Arc<dyn DeviceApi>) -> Result<Self> {
        Self::with_flags(device, vk::QueryControlFlags::empty())
    }

    /// 创建精确计数的遮挡查询
    pub fn new_precise(device: Arc<dyn DeviceApi>) -> Result<Self> {
        Self::with_flags(device, vk::QueryControlFlags::PRECISE)
    }

    fn with_flags(device: Arc<dyn DeviceApi>, flags: vk::QueryControlFlags) -> Result<Self> {
        let pool = QueryPool::new(
            device,
            vk::QueryType::OCCLUSION,
            1,
            vk::QueryPipelineStatisticFlags::empty(),
        )?;
        Ok(Self { pool, flags })
    }

    /// 重置查询池，必须在渲染通道外录制
    pub fn reset(&self, command_buffer: &CommandBuffer) {
        self.pool.reset(command_buffer);
    }

    /// 重置并开始查询
    ///
    /// 只能在渲染通道外调用；通道内计数请用 `reset` + `begin_after_reset`。
    pub fn begin(&self, command_buffer: &CommandBuffer) {
        self.pool.reset(command_buffer);
        self.begin_after_reset(command_buffer);
    }

    /// 在已经重置过的查询池上开始查询，可以在渲染通道内调用
    pub fn begin_after_reset(&self, command_buffer: &CommandBuffer) {
        self.pool
            .device
            .cmd_begin_query(command_buffer.handle(), self.pool.pool, 0, self.flags);
    }

    pub fn end(&self, command_buffer: &CommandBuffer) {
        self.pool
            .device
            .cmd_end_query(command_buffer.handle(), self.pool.pool, 0);
    }

    /// 读回通过的样本数
    pub fn get_result(&self) -> Result<u64> {
        let mut samples = [0u64; 1];
        self.pool.read(1, &mut samples)?;
        Ok(samples[0])
    }
}

/// 管线统计计数
///
/// 字段顺序与 Vulkan 写出结果的顺序（按标志位从低到高）一致。
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PipelineStatistics {
    pub input_assembly_vertices: u64,
    pub input_assembly_primitives: u64,
    pub vertex_shader_invocations: u64,
    pub geometry_shader_invocations: u64,
    pub geometry_shader_primitives: u64,
    pub clipping_invocations: u64,
    pub clipping_primitives: u64,
    pub fragment_shader_invocations: u64,
    pub compute_shader_invocations: u64,
}

impl PipelineStatistics {
    /// 计数器数量
    pub const COUNTERS: u32 = 9;

    /// 查询池需要开启的统计标志
    pub fn flags() -> vk::QueryPipelineStatisticFlags {
        vk::QueryPipelineStatisticFlags::INPUT_ASSEMBLY_VERTICES
            | vk::QueryPipelineStatisticFlags::INPUT_ASSEMBLY_PRIMITIVES
            | vk::QueryPipelineStatisticFlags::VERTEX_SHADER_INVOCATIONS
            | vk::QueryPipelineStatisticFlags::GEOMETRY_SHADER_INVOCATIONS
            | vk::QueryPipelineStatisticFlags::GEOMETRY_SHADER_PRIMITIVES
            | vk::QueryPipelineStatisticFlags::CLIPPING_INVOCATIONS
            | vk::QueryPipelineStatisticFlags::CLIPPING_PRIMITIVES
            | vk::QueryPipelineStatisticFlags::FRAGMENT_SHADER_INVOCATIONS
            | vk::QueryPipelineStatisticFlags::COMPUTE_SHADER_INVOCATIONS
    }
}

/// 管线统计查询
pub struct PipelineStatisticsQuery {
    pool: QueryPool,
}

impl PipelineStatisticsQuery {
    pub fn new(device: Arc<dyn DeviceApi>) -> Result<Self> {
        let pool = QueryPool::new(
            device,
            vk::QueryType::PIPELINE_STATISTICS,
            1,
            PipelineStatistics::flags(),
        )?;
        Ok(Self { pool })
    }

    /// 重置查询池，必须在渲染通道外录制
    pub fn reset(&self, command_buffer: &CommandBuffer) {
        self.pool.reset(command_buffer);
    }

    /// 重置并开始统计，只能在渲染通道外调用
    pub fn begin(&self, command_buffer: &CommandBuffer) {
        self.pool.reset(command_buffer);
        self.begin_after_reset(command_buffer);
    }

    /// 在已经重置过的查询池上开始统计
    pub fn begin_after_reset(&self, command_buffer: &CommandBuffer) {
        self.pool.device.cmd_begin_query(
            command_buffer.handle(),
            self.pool.pool,
            0,
            vk::QueryControlFlags::empty(),
        );
    }

    pub fn end(&self, command_buffer: &CommandBuffer) {
        self.pool
            .device
            .cmd_end_query(command_buffer.handle(), self.pool.pool, 0);
    }

    /// 读回全部计数
    pub fn get_result(&self) -> Result<PipelineStatistics> {
        let mut raw = [0u64; PipelineStatistics::COUNTERS as usize];
        self.pool.read(PipelineStatistics::COUNTERS, &mut raw)?;
        Ok(bytemuck::cast(raw))
    }
}
