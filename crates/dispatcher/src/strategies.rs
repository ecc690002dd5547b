use std::sync::Arc;

use tracing::debug;

use extraction_core::{DispatchStrategyKind, DistributedTask, WorkerNode};

use crate::adaptive_scheduler::AdaptiveScheduler;

/// Worker选择策略
///
/// 候选列表已经过健康检查。返回的ID必须来自候选列表，返回 `None`
/// 表示本轮无法分配，协调器会把任务放回队列并退避。
pub trait DispatchStrategy: Send + Sync {
    fn select_worker(
        &self,
        task: &DistributedTask,
        file_size: u64,
        candidates: &[WorkerNode],
    ) -> Option<String>;

    /// 每次执行结束后反馈耗时
    fn record_performance(&self, _worker_id: &str, _processing_time: f64) {}

    fn name(&self) -> &str;
}

/// 选择利用率最低的Worker，相同时注册顺序靠前的优先
pub struct LeastUtilizedStrategy;

/// 按历史耗时估算完成时间最短的Worker
pub struct AdaptiveStrategy {
    scheduler: AdaptiveScheduler,
}

impl LeastUtilizedStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LeastUtilizedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchStrategy for LeastUtilizedStrategy {
    fn select_worker(
        &self,
        task: &DistributedTask,
        _file_size: u64,
        candidates: &[WorkerNode],
    ) -> Option<String> {
        let selected = least_utilized(candidates)?;

        debug!(
            "最低利用率策略为任务 {} 选择Worker: {} (利用率: {:.2})",
            task.task_id,
            selected.worker_id,
            selected.utilization()
        );

        Some(selected.worker_id.clone())
    }

    fn name(&self) -> &str {
        "LeastUtilized"
    }
}

impl AdaptiveStrategy {
    pub fn new() -> Self {
        Self {
            scheduler: AdaptiveScheduler::new(),
        }
    }

    pub fn scheduler(&self) -> &AdaptiveScheduler {
        &self.scheduler
    }
}

impl Default for AdaptiveStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchStrategy for AdaptiveStrategy {
    fn select_worker(
        &self,
        task: &DistributedTask,
        file_size: u64,
        candidates: &[WorkerNode],
    ) -> Option<String> {
        // 只在空闲容量上比较估算耗时
        let available: Vec<&str> = candidates
            .iter()
            .filter(|w| w.utilization() < 1.0)
            .map(|w| w.worker_id.as_str())
            .collect();

        if available.is_empty() {
            debug!("没有空闲的Worker，任务 {} 退回最低利用率选择", task.task_id);
            return least_utilized(candidates).map(|w| w.worker_id.clone());
        }

        self.scheduler.select_best_worker(&available, file_size)
    }

    fn record_performance(&self, worker_id: &str, processing_time: f64) {
        self.scheduler.record_performance(worker_id, processing_time);
    }

    fn name(&self) -> &str {
        "Adaptive"
    }
}

/// 利用率最低的Worker，`min_by` 在相等时返回第一个
pub fn least_utilized(candidates: &[WorkerNode]) -> Option<&WorkerNode> {
    candidates.iter().min_by(|a, b| {
        a.utilization()
            .partial_cmp(&b.utilization())
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// 根据配置创建策略
pub fn create_strategy(kind: DispatchStrategyKind) -> Arc<dyn DispatchStrategy> {
    match kind {
        DispatchStrategyKind::LeastUtilized => Arc::new(LeastUtilizedStrategy::new()),
        DispatchStrategyKind::Adaptive => Arc::new(AdaptiveStrategy::new()),
    }
}
