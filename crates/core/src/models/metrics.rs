use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个Worker的执行统计
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkerStats {
    pub completed: u64,
    pub failed: u64,
    pub total_time: f64,
}

impl WorkerStats {
    pub fn average_time(&self) -> f64 {
        let total = self.completed + self.failed;
        if total == 0 {
            0.0
        } else {
            self.total_time / total as f64
        }
    }
}

/// 调度器聚合指标
///
/// `completed_tasks` 统计的是到达终态的任务数（成功或重试耗尽），
/// 因此队列排空后总有 `completed_tasks == successful_tasks + failed_tasks`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistributedMetrics {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub successful_tasks: u64,
    /// 被重新入队的失败尝试次数
    pub retried_attempts: u64,
    pub start_time: DateTime<Utc>,
    pub worker_stats: BTreeMap<String, WorkerStats>,
}

impl Default for DistributedMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DistributedMetrics {
    pub fn new() -> Self {
        Self {
            total_tasks: 0,
            completed_tasks: 0,
            failed_tasks: 0,
            successful_tasks: 0,
            retried_attempts: 0,
            start_time: Utc::now(),
            worker_stats: BTreeMap::new(),
        }
    }

    /// 成功率（百分比），没有完成的任务时为0
    pub fn success_rate(&self) -> f64 {
        if self.completed_tasks == 0 {
            0.0
        } else {
            self.successful_tasks as f64 / self.completed_tasks as f64 * 100.0
        }
    }

    /// 自开始以来经过的秒数
    pub fn elapsed_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds().max(0) as f64 / 1000.0
    }

    /// 每秒完成的任务数
    pub fn throughput(&self) -> f64 {
        let elapsed = self.elapsed_seconds();
        if elapsed <= 0.0 {
            0.0
        } else {
            self.completed_tasks as f64 / elapsed
        }
    }

    pub fn record_success(&mut self, worker_id: &str, processing_time: f64) {
        self.completed_tasks += 1;
        self.successful_tasks += 1;
        let stats = self.worker_stats.entry(worker_id.to_string()).or_default();
        stats.completed += 1;
        stats.total_time += processing_time;
    }

    pub fn record_failure(&mut self, worker_id: &str, processing_time: f64) {
        self.completed_tasks += 1;
        self.failed_tasks += 1;
        let stats = self.worker_stats.entry(worker_id.to_string()).or_default();
        stats.failed += 1;
        stats.total_time += processing_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_without_completions() {
        let metrics = DistributedMetrics::new();
        assert_eq!(metrics.success_rate(), 0.0);
        assert_eq!(metrics.throughput(), 0.0);
    }

    #[test]
    fn test_record_success_and_failure() {
        let mut metrics = DistributedMetrics::new();
        metrics.record_success("worker_0", 0.5);
        metrics.record_success("worker_0", 1.5);
        metrics.record_failure("worker_1", 2.0);
        metrics.record_success("worker_1", 1.0);

        assert_eq!(metrics.completed_tasks, 4);
        assert_eq!(metrics.successful_tasks, 3);
        assert_eq!(metrics.failed_tasks, 1);
        assert_eq!(
            metrics.completed_tasks,
            metrics.successful_tasks + metrics.failed_tasks
        );
        assert_eq!(metrics.success_rate(), 75.0);

        let w0 = &metrics.worker_stats["worker_0"];
        assert_eq!(w0.completed, 2);
        assert_eq!(w0.total_time, 2.0);
        assert_eq!(w0.average_time(), 1.0);

        let w1 = &metrics.worker_stats["worker_1"];
        assert_eq!(w1.failed, 1);
        assert_eq!(w1.completed, 1);
    }
}
