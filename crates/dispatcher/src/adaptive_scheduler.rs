use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// 每个Worker保留的耗时样本上限
pub const WORKER_HISTORY_CAP: usize = 100;
/// 估算时使用的最近样本数
const ESTIMATE_WINDOW: usize = 10;
/// 估算耗时时的参考文件大小（10MB）
const REFERENCE_FILE_SIZE: f64 = 10.0 * 1024.0 * 1024.0;

/// 按Worker历史耗时估算完成时间的调度器
///
/// 只负责估算与比较，调用方需要预先筛选出健康的Worker。
#[derive(Debug, Default)]
pub struct AdaptiveScheduler {
    history: Mutex<HashMap<String, VecDeque<f64>>>,
}

impl AdaptiveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次处理耗时，只保留最近100个样本
    pub fn record_performance(&self, worker_id: &str, processing_time: f64) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let samples = history.entry(worker_id.to_string()).or_default();
        samples.push_back(processing_time);
        while samples.len() > WORKER_HISTORY_CAP {
            samples.pop_front();
        }
    }

    /// 估算Worker处理指定大小文件的耗时（秒），没有历史时为0
    pub fn estimate_task_time(&self, worker_id: &str, file_size: u64) -> f64 {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(samples) = history.get(worker_id).filter(|s| !s.is_empty()) else {
            return 0.0;
        };

        let window = samples.len().min(ESTIMATE_WINDOW);
        let mean = samples.iter().rev().take(window).sum::<f64>() / window as f64;
        mean * (file_size as f64 / REFERENCE_FILE_SIZE).max(0.1)
    }

    /// 选择估算耗时最短的Worker，相同时先出现的优先
    pub fn select_best_worker<S: AsRef<str>>(&self, workers: &[S], file_size: u64) -> Option<String> {
        let mut best: Option<(&str, f64)> = None;
        for worker_id in workers {
            let worker_id = worker_id.as_ref();
            let estimate = self.estimate_task_time(worker_id, file_size);
            if best.map_or(true, |(_, current)| estimate < current) {
                best = Some((worker_id, estimate));
            }
        }

        best.map(|(worker_id, estimate)| {
            debug!("自适应调度选择Worker: {} (估算耗时: {:.3}s)", worker_id, estimate);
            worker_id.to_string()
        })
    }

    /// Worker当前保留的样本数
    pub fn sample_count(&self, worker_id: &str) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(worker_id)
            .map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_estimate_without_history_is_zero() {
        let scheduler = AdaptiveScheduler::new();
        assert_eq!(scheduler.estimate_task_time("w1", 100 * MB), 0.0);
    }

    #[test]
    fn test_estimate_scales_with_size() {
        let scheduler = AdaptiveScheduler::new();
        scheduler.record_performance("w1", 2.0);
        scheduler.record_performance("w1", 4.0);

        assert!((scheduler.estimate_task_time("w1", 20 * MB) - 6.0).abs() < 1e-9);
        // small files are floored at a tenth of the reference size
        assert!((scheduler.estimate_task_time("w1", 0) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_uses_last_ten_samples() {
        let scheduler = AdaptiveScheduler::new();
        for _ in 0..20 {
            scheduler.record_performance("w1", 100.0);
        }
        for _ in 0..10 {
            scheduler.record_performance("w1", 1.0);
        }
        assert!((scheduler.estimate_task_time("w1", 10 * MB) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_history_is_capped() {
        let scheduler = AdaptiveScheduler::new();
        for i in 0..150 {
            scheduler.record_performance("w1", i as f64);
        }
        assert_eq!(scheduler.sample_count("w1"), WORKER_HISTORY_CAP);
    }

    #[test]
    fn test_select_lowest_estimate() {
        let scheduler = AdaptiveScheduler::new();
        scheduler.record_performance("slow", 5.0);
        scheduler.record_performance("fast", 1.0);

        assert_eq!(
            scheduler.select_best_worker(&["slow", "fast"], 10 * MB),
            Some("fast".to_string())
        );
        // a worker without history estimates 0
        assert_eq!(
            scheduler.select_best_worker(&["slow", "fast", "new"], 10 * MB),
            Some("new".to_string())
        );
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let scheduler = AdaptiveScheduler::new();
        assert_eq!(
            scheduler.select_best_worker(&["b", "a"], MB),
            Some("b".to_string())
        );
        let empty: [&str; 0] = [];
        assert_eq!(scheduler.select_best_worker(&empty, MB), None);
    }
}
