use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chunk_sizer::MB;

/// 每种文件类型保留的历史样本上限
pub const DEFAULT_HISTORY_CAP: usize = 1000;
/// 预测时使用的最近样本数
const RECENT_WINDOW: usize = 10;

/// 某种文件类型的耗时统计
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceStats {
    pub count: usize,
    pub mean_time: f64,
    pub median_time: f64,
    pub min_time: f64,
    pub max_time: f64,
    pub mean_size: f64,
    /// 样本标准差，少于2个样本时为0
    pub stdev_time: f64,
}

#[derive(Debug, Default)]
struct PerformanceRecord {
    sizes: VecDeque<u64>,
    times: VecDeque<f64>,
}

impl PerformanceRecord {
    fn push(&mut self, size: u64, time: f64, cap: usize) {
        self.sizes.push_back(size);
        self.times.push_back(time);
        while self.times.len() > cap {
            self.sizes.pop_front();
            self.times.pop_front();
        }
    }

    fn recent(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        let skip = self.times.len().saturating_sub(RECENT_WINDOW);
        self.sizes
            .iter()
            .copied()
            .zip(self.times.iter().copied())
            .skip(skip)
    }
}

/// 基于历史吞吐量的耗时预测器
#[derive(Debug)]
pub struct PerformancePredictor {
    history_cap: usize,
    history: RwLock<HashMap<String, PerformanceRecord>>,
}

impl Default for PerformancePredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformancePredictor {
    pub fn new() -> Self {
        Self::with_history_cap(DEFAULT_HISTORY_CAP)
    }

    pub fn with_history_cap(history_cap: usize) -> Self {
        Self {
            history_cap: history_cap.max(1),
            history: RwLock::new(HashMap::new()),
        }
    }

    /// 记录一次提取的大小和耗时
    pub fn record_extraction(&self, file_type: &str, file_size: u64, processing_time: f64) {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        history.entry(file_type.to_string()).or_default().push(
            file_size,
            processing_time,
            self.history_cap,
        );
        trace!(file_type, file_size, processing_time, "记录提取耗时");
    }

    /// 预测处理耗时（秒）
    pub fn predict_time(&self, file_type: &str, file_size: u64) -> f64 {
        let history = self.history.read().unwrap_or_else(PoisonError::into_inner);
        let Some(record) = history.get(file_type).filter(|r| !r.times.is_empty()) else {
            return file_size as f64 / (100 * MB) as f64;
        };

        let mut throughputs: Vec<f64> = record
            .recent()
            .map(|(size, time)| if time > 0.0 { size as f64 / time } else { 0.0 })
            .collect();
        let throughput = median(&mut throughputs);

        if throughput > 0.0 {
            file_size as f64 / throughput
        } else {
            let mut times: Vec<f64> = record.recent().map(|(_, time)| time).collect();
            median(&mut times)
        }
    }

    pub fn has_history(&self, file_type: &str) -> bool {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file_type)
            .is_some_and(|r| !r.times.is_empty())
    }

    /// 某种文件类型的统计，没有记录时返回 `None`
    pub fn get_stats(&self, file_type: &str) -> Option<PerformanceStats> {
        let history = self.history.read().unwrap_or_else(PoisonError::into_inner);
        let record = history.get(file_type)?;
        if record.times.is_empty() {
            return None;
        }

        let mut times: Vec<f64> = record.times.iter().copied().collect();
        let count = times.len();
        // 以第一个样本为基准求均值，相同样本时均值与样本完全相等
        let base = times[0];
        let mean_time = base + times.iter().map(|t| t - base).sum::<f64>() / count as f64;
        let stdev_time = if count < 2 {
            0.0
        } else {
            let variance = times
                .iter()
                .map(|t| (t - mean_time).powi(2))
                .sum::<f64>()
                / (count - 1) as f64;
            variance.sqrt()
        };
        let min_time = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max_time = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_size = record.sizes.iter().map(|&s| s as f64).sum::<f64>() / count as f64;

        Some(PerformanceStats {
            count,
            mean_time,
            median_time: median(&mut times),
            min_time,
            max_time,
            mean_size,
            stdev_time,
        })
    }

    /// 已记录的文件类型（排序后）
    pub fn file_types(&self) -> Vec<String> {
        let history = self.history.read().unwrap_or_else(PoisonError::into_inner);
        let mut types: Vec<String> = history.keys().cloned().collect();
        types.sort();
        types
    }
}

/// 中位数，偶数个样本取中间两个的平均值；空切片返回0
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_without_history() {
        let predictor = PerformancePredictor::new();
        assert_eq!(predictor.predict_time("dcm", 200 * MB), 2.0);
        assert!(!predictor.has_history("dcm"));
        assert!(predictor.get_stats("dcm").is_none());
    }

    #[test]
    fn test_prediction_uses_median_throughput() {
        let predictor = PerformancePredictor::new();
        predictor.record_extraction("jpg", 10 * MB, 1.0);
        predictor.record_extraction("jpg", 20 * MB, 1.0);
        // outlier does not move the median
        predictor.record_extraction("jpg", 10 * MB, 100.0);

        let predicted = predictor.predict_time("jpg", 40 * MB);
        assert!((predicted - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_time_samples_fall_back_to_median_time() {
        let predictor = PerformancePredictor::new();
        predictor.record_extraction("pdf", 0, 0.0);
        predictor.record_extraction("pdf", 0, 0.4);
        predictor.record_extraction("pdf", 0, 0.2);

        assert!((predictor.predict_time("pdf", MB) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_only_recent_window_is_used() {
        let predictor = PerformancePredictor::new();
        for _ in 0..50 {
            predictor.record_extraction("mp4", MB, 10.0);
        }
        for _ in 0..10 {
            predictor.record_extraction("mp4", MB, 1.0);
        }
        assert!((predictor.predict_time("mp4", 2 * MB) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_history_is_capped() {
        let predictor = PerformancePredictor::with_history_cap(5);
        for i in 0..8 {
            predictor.record_extraction("h5", MB, i as f64);
        }
        let stats = predictor.get_stats("h5").unwrap();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.min_time, 3.0);
        assert_eq!(stats.max_time, 7.0);
    }

    #[test]
    fn test_identical_times_have_zero_stdev() {
        let predictor = PerformancePredictor::new();
        for size in [MB, 2 * MB, 3 * MB] {
            predictor.record_extraction("fits", size, 0.5);
        }

        let stats = predictor.get_stats("fits").unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.stdev_time, 0.0);
        assert_eq!(stats.mean_time, 0.5);
        assert_eq!(stats.median_time, 0.5);
        assert_eq!(stats.mean_size, (2 * MB) as f64);
    }

    #[test]
    fn test_identical_inexact_times_keep_exact_stats() {
        let predictor = PerformancePredictor::new();
        for t in [0.1, 0.3, 1.1, 2.7] {
            let file_type = format!("t{t}");
            for _ in 0..3 {
                predictor.record_extraction(&file_type, MB, t);
            }

            let stats = predictor.get_stats(&file_type).unwrap();
            assert_eq!(stats.mean_time, t);
            assert_eq!(stats.median_time, t);
            assert_eq!(stats.stdev_time, 0.0);
        }
    }

    #[test]
    fn test_stats_values() {
        let predictor = PerformancePredictor::new();
        predictor.record_extraction("nc", 100, 1.0);
        predictor.record_extraction("nc", 300, 3.0);
        predictor.record_extraction("dcm", 1, 1.0);

        let stats = predictor.get_stats("nc").unwrap();
        assert_eq!(stats.median_time, 2.0);
        assert!((stats.stdev_time - 2f64.sqrt()).abs() < 1e-9);
        assert_eq!(predictor.file_types(), vec!["dcm", "nc"]);

        let single = predictor.get_stats("dcm").unwrap();
        assert_eq!(single.stdev_time, 0.0);
    }
}
