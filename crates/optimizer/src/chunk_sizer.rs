use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use extraction_core::ExecutionHints;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * KB;
pub const GB: u64 = 1024 * MB;

/// 无法读取文件时使用的基准分块大小
pub const DEFAULT_CHUNK_SIZE: u64 = MB;
/// 无法读取文件时使用的复杂度
pub const DEFAULT_COMPLEXITY: f64 = 0.5;
/// 未知格式的复杂度
pub const BASELINE_COMPLEXITY: f64 = 0.4;

/// 处理100MB数据的基准耗时（秒）
const SECONDS_PER_100MB: f64 = 1.0;

/// 文件特征
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileCharacteristics {
    pub file_path: String,
    pub file_size: u64,
    /// 小写扩展名，没有扩展名时为空
    pub file_type: String,
    pub estimated_chunks: u64,
    pub recommended_chunk_size: u64,
    pub expected_processing_time: f64,
    /// 格式复杂度，取值 [0, 1]
    pub complexity_score: f64,
}

impl FileCharacteristics {
    /// 根据文件大小和格式计算特征
    pub fn from_size(file_path: &str, file_size: u64) -> Self {
        let file_type = file_type_of(file_path);
        let complexity_score = complexity_for(&file_type);
        let recommended_chunk_size = chunk_size_for(file_size, complexity_score);

        Self {
            file_path: file_path.to_string(),
            file_size,
            file_type,
            estimated_chunks: file_size.div_ceil(recommended_chunk_size),
            recommended_chunk_size,
            expected_processing_time: file_size as f64 / (100 * MB) as f64
                * SECONDS_PER_100MB
                * (1.0 + 2.0 * complexity_score),
            complexity_score,
        }
    }

    /// 读取失败时返回的默认特征
    pub fn fallback(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            file_size: 0,
            file_type: file_type_of(file_path),
            estimated_chunks: 0,
            recommended_chunk_size: DEFAULT_CHUNK_SIZE,
            expected_processing_time: 0.0,
            complexity_score: DEFAULT_COMPLEXITY,
        }
    }

    pub fn hints(&self) -> ExecutionHints {
        ExecutionHints {
            chunk_size: self.recommended_chunk_size,
            expected_time: self.expected_processing_time,
            complexity: self.complexity_score,
        }
    }
}

/// 文件扩展名（小写），用作格式类型
pub fn file_type_of(file_path: &str) -> String {
    Path::new(file_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// 格式复杂度表
pub fn complexity_for(file_type: &str) -> f64 {
    match file_type {
        "dcm" | "dicom" => 0.9,
        "fits" | "fit" | "fts" => 0.8,
        "h5" | "hdf5" | "hdf" | "nc" | "netcdf" => 0.7,
        "mp4" | "avi" | "mov" | "mkv" => 0.6,
        "pdf" => 0.5,
        _ => BASELINE_COMPLEXITY,
    }
}

/// 按大小分档选择基础分块，再按复杂度调整
pub fn chunk_size_for(file_size: u64, complexity: f64) -> u64 {
    let base = if file_size < 10 * MB {
        256 * KB
    } else if file_size < 100 * MB {
        MB
    } else if file_size < GB {
        5 * MB
    } else {
        10 * MB
    };

    if complexity > 0.7 {
        base / 2
    } else if complexity < 0.3 {
        base * 3 / 2
    } else {
        base
    }
}

/// 自适应分块计算器
///
/// 分析结果按路径缓存。文件在首次分析之后被修改不会使缓存失效，
/// 需要重新分析时调用 [`AdaptiveChunkSizer::clear_cache`]。
#[derive(Debug, Default)]
pub struct AdaptiveChunkSizer {
    cache: RwLock<HashMap<String, FileCharacteristics>>,
}

impl AdaptiveChunkSizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 分析文件特征，从不返回错误
    pub fn analyze_file(&self, file_path: &str) -> FileCharacteristics {
        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file_path)
        {
            return cached.clone();
        }

        let file_size = match std::fs::metadata(file_path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("分析文件失败 {}: {}，使用默认特征", file_path, e);
                return FileCharacteristics::fallback(file_path);
            }
        };

        let characteristics = FileCharacteristics::from_size(file_path, file_size);
        debug!(
            "文件 {} 大小 {} 复杂度 {:.1} 分块 {} x {}",
            file_path,
            file_size,
            characteristics.complexity_score,
            characteristics.recommended_chunk_size,
            characteristics.estimated_chunks
        );

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file_path.to_string(), characteristics.clone());
        characteristics
    }

    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
