//! 自适应优化层
//!
//! 文件特征分析、耗时预测、批次排序分配以及GPU扩展点。
//! 所有组件都是尽力而为的：分析失败时返回安全的默认值，不会让调度流程失败。

pub mod batch_optimizer;
pub mod chunk_sizer;
pub mod gpu;
pub mod predictor;

pub use batch_optimizer::*;
pub use chunk_sizer::*;
pub use gpu::*;
pub use predictor::*;

use std::collections::BTreeMap;
use std::sync::Arc;

use extraction_core::{ExecutionHints, Metadata, OptimizerConfig};
use serde::{Deserialize, Serialize};

/// 单个文件的优化配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizedConfig {
    pub chunk_size: u64,
    pub estimated_chunks: u64,
    pub expected_processing_time: f64,
    pub complexity: f64,
}

impl From<&FileCharacteristics> for OptimizedConfig {
    fn from(c: &FileCharacteristics) -> Self {
        Self {
            chunk_size: c.recommended_chunk_size,
            estimated_chunks: c.estimated_chunks,
            expected_processing_time: c.expected_processing_time,
            complexity: c.complexity_score,
        }
    }
}

/// 优化组件的组合，服务启动时构建一次并共享
#[derive(Debug, Clone)]
pub struct OptimizationEngine {
    chunk_sizer: Arc<AdaptiveChunkSizer>,
    predictor: Arc<PerformancePredictor>,
    batch_optimizer: BatchOptimizer,
    gpu: GpuAccelerator,
}

impl Default for OptimizationEngine {
    fn default() -> Self {
        Self::from_config(&OptimizerConfig::default())
    }
}

impl OptimizationEngine {
    pub fn from_config(config: &OptimizerConfig) -> Self {
        let chunk_sizer = Arc::new(AdaptiveChunkSizer::new());
        let predictor = Arc::new(PerformancePredictor::with_history_cap(config.history_cap));
        let batch_optimizer = BatchOptimizer::new(chunk_sizer.clone(), predictor.clone());

        Self {
            chunk_sizer,
            predictor,
            batch_optimizer,
            gpu: GpuAccelerator::new(config.gpu_enabled),
        }
    }

    pub fn chunk_sizer(&self) -> &AdaptiveChunkSizer {
        &self.chunk_sizer
    }

    pub fn predictor(&self) -> &PerformancePredictor {
        &self.predictor
    }

    pub fn batch_optimizer(&self) -> &BatchOptimizer {
        &self.batch_optimizer
    }

    pub fn gpu(&self) -> &GpuAccelerator {
        &self.gpu
    }

    pub fn create_optimized_config(&self, file_path: &str) -> OptimizedConfig {
        OptimizedConfig::from(&self.chunk_sizer.analyze_file(file_path))
    }

    /// 单个文件的执行提示
    pub fn execution_hints(&self, file_path: &str) -> ExecutionHints {
        self.batch_optimizer
            .hints_for(&self.chunk_sizer.analyze_file(file_path))
    }

    pub fn optimize_batch<S: AsRef<str>>(
        &self,
        file_paths: &[S],
        num_workers: usize,
    ) -> BTreeMap<usize, Vec<String>> {
        self.batch_optimizer
            .distribute_across_workers(file_paths, num_workers)
    }

    /// 把一次实际提取的耗时反馈给预测器
    ///
    /// `file_size` 由调用方提供，这里只按扩展名取文件类型，不访问文件系统。
    pub fn record_extraction(&self, file_path: &str, file_size: u64, processing_time: f64) {
        self.predictor
            .record_extraction(&file_type_of(file_path), file_size, processing_time);
    }

    /// 提取完成后的GPU扩展点
    pub fn finalize_metadata(&self, file_path: &str, metadata: Metadata) -> Metadata {
        self.gpu.accelerate_extraction(file_path, metadata)
    }
}

/// 计算单个文件的分块与耗时配置
pub fn create_optimized_config(file_path: &str) -> OptimizedConfig {
    OptimizationEngine::default().create_optimized_config(file_path)
}

/// 排序并把批次轮询分配给 `num_workers` 个Worker
pub fn optimize_batch<S: AsRef<str>>(
    file_paths: &[S],
    num_workers: usize,
) -> BTreeMap<usize, Vec<String>> {
    OptimizationEngine::default().optimize_batch(file_paths, num_workers)
}
