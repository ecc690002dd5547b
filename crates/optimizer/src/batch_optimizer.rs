use std::collections::BTreeMap;
use std::sync::Arc;

use extraction_core::ExecutionHints;
use tracing::debug;

use crate::chunk_sizer::{AdaptiveChunkSizer, FileCharacteristics};
use crate::predictor::PerformancePredictor;

/// 批次排序与分配
///
/// 按 (复杂度, 大小) 降序排列批次，最难最大的文件最先开始，
/// 然后轮询分配给各个Worker，使每个Worker拿到的难度大致均衡。
#[derive(Debug, Clone)]
pub struct BatchOptimizer {
    chunk_sizer: Arc<AdaptiveChunkSizer>,
    predictor: Arc<PerformancePredictor>,
}

impl Default for BatchOptimizer {
    fn default() -> Self {
        Self::new(
            Arc::new(AdaptiveChunkSizer::new()),
            Arc::new(PerformancePredictor::new()),
        )
    }
}

impl BatchOptimizer {
    pub fn new(chunk_sizer: Arc<AdaptiveChunkSizer>, predictor: Arc<PerformancePredictor>) -> Self {
        Self {
            chunk_sizer,
            predictor,
        }
    }

    /// 按难度降序排列，返回每个文件及其执行提示
    ///
    /// 排序是稳定的：复杂度和大小都相同的文件保持提交顺序。
    pub fn optimize_batch_order<S: AsRef<str>>(&self, file_paths: &[S]) -> Vec<(String, ExecutionHints)> {
        let mut analyzed: Vec<FileCharacteristics> = file_paths
            .iter()
            .map(|path| self.chunk_sizer.analyze_file(path.as_ref()))
            .collect();

        analyzed.sort_by(|a, b| {
            b.complexity_score
                .total_cmp(&a.complexity_score)
                .then_with(|| b.file_size.cmp(&a.file_size))
        });

        analyzed
            .into_iter()
            .map(|c| {
                let hints = self.hints_for(&c);
                (c.file_path, hints)
            })
            .collect()
    }

    /// 轮询分配：第 i 个文件分给 `i % num_workers`
    ///
    /// 每个Worker编号都出现在结果中，没有分到文件时为空列表。
    /// `num_workers` 为0时按1处理。
    pub fn distribute_across_workers<S: AsRef<str>>(
        &self,
        file_paths: &[S],
        num_workers: usize,
    ) -> BTreeMap<usize, Vec<String>> {
        let num_workers = num_workers.max(1);
        let mut distribution: BTreeMap<usize, Vec<String>> =
            (0..num_workers).map(|i| (i, Vec::new())).collect();

        for (index, (path, _)) in self.optimize_batch_order(file_paths).into_iter().enumerate() {
            distribution
                .entry(index % num_workers)
                .or_default()
                .push(path);
        }

        debug!(
            "批次分配完成: {} 个文件, {} 个Worker",
            file_paths.len(),
            num_workers
        );
        distribution
    }

    /// 有历史记录时用预测器估算耗时，否则用特征分析的估算
    pub fn hints_for(&self, c: &FileCharacteristics) -> ExecutionHints {
        let mut hints = c.hints();
        if self.predictor.has_history(&c.file_type) {
            hints.expected_time = self.predictor.predict_time(&c.file_type, c.file_size);
        }
        hints
    }
}
