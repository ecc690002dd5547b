//! 分布式提取调度
//!
//! [`DistributedCoordinator`] 负责Worker注册、优先级队列、调度循环、
//! 重试和统计；[`DispatchStrategy`] 决定每个任务交给哪个Worker。

pub mod adaptive_scheduler;
pub mod coordinator;
pub mod retry;
pub mod strategies;

pub use adaptive_scheduler::*;
pub use coordinator::*;
pub use retry::*;
pub use strategies::*;

use std::sync::Arc;

use extraction_core::{
    CoordinatorConfig, DistributedMetrics, DistributedResult, MetadataExtractor,
};
use extraction_infrastructure::InMemoryMessageQueue;
use tracing::info;

/// 用 `num_workers` 个本地Worker处理一批文件，直到全部完成
///
/// Worker命名为 `worker_<i>`，主机为 `localhost`，端口从5000递增。
/// `num_workers` 为0时按1处理。
pub async fn extract_distributed<S: AsRef<str>>(
    file_paths: &[S],
    extractor: &dyn MetadataExtractor,
    num_workers: usize,
) -> (Vec<DistributedResult>, DistributedMetrics) {
    let coordinator = DistributedCoordinator::with_config(
        CoordinatorConfig::default(),
        Arc::new(InMemoryMessageQueue::new()),
    );
    run_batch(&coordinator, file_paths, extractor, num_workers).await
}

/// 在给定协调器上注册本地Worker、提交批次并运行调度循环
pub async fn run_batch<S: AsRef<str>>(
    coordinator: &DistributedCoordinator,
    file_paths: &[S],
    extractor: &dyn MetadataExtractor,
    num_workers: usize,
) -> (Vec<DistributedResult>, DistributedMetrics) {
    let num_workers = register_local_workers(coordinator, num_workers).await;
    coordinator.add_tasks_batch(file_paths).await;
    info!(
        "开始分布式提取: {} 个文件, {} 个Worker",
        file_paths.len(),
        num_workers
    );

    coordinator.process_tasks(extractor).await
}

/// 注册 `worker_0..worker_{n-1}`，返回实际注册的数量（至少为1）
pub async fn register_local_workers(
    coordinator: &DistributedCoordinator,
    num_workers: usize,
) -> usize {
    let num_workers = num_workers.max(1);
    let hostname = coordinator.config().worker_hostname.clone();
    let base_port = coordinator.config().base_port;

    for i in 0..num_workers {
        let port = base_port.saturating_add(u16::try_from(i).unwrap_or(u16::MAX));
        coordinator
            .register_worker(&format!("worker_{i}"), &hostname, port)
            .await;
    }

    num_workers
}
