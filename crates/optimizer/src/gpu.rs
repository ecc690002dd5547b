use std::path::Path;

use extraction_core::Metadata;
use tracing::{debug, info};

use crate::chunk_sizer::file_type_of;

/// 可以走GPU路径的格式
pub const GPU_FORMATS: &[&str] = &[
    "mp4", "avi", "mov", "mkv", "webm", "jpg", "jpeg", "png", "tiff", "tif",
];

/// GPU加速扩展点
///
/// 目前只做能力探测和格式判断，`accelerate_extraction` 原样返回元数据。
#[derive(Debug, Clone)]
pub struct GpuAccelerator {
    gpu_available: bool,
}

impl Default for GpuAccelerator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl GpuAccelerator {
    /// `force` 为空时自动探测
    pub fn new(force: Option<bool>) -> Self {
        let gpu_available = force.unwrap_or_else(detect_gpu);
        info!("GPU加速可用: {}", gpu_available);
        Self { gpu_available }
    }

    pub fn gpu_available(&self) -> bool {
        self.gpu_available
    }

    pub fn can_accelerate(&self, file_path: &str) -> bool {
        self.gpu_available && GPU_FORMATS.contains(&file_type_of(file_path).as_str())
    }

    /// 不做任何变换，只记录可加速的文件
    pub fn accelerate_extraction(&self, file_path: &str, metadata: Metadata) -> Metadata {
        if self.can_accelerate(file_path) {
            debug!("文件可使用GPU加速: {}", file_path);
        }
        metadata
    }
}

/// 尽力探测CUDA运行环境，从不报错
fn detect_gpu() -> bool {
    if let Some(devices) = std::env::var_os("CUDA_VISIBLE_DEVICES") {
        let devices = devices.to_string_lossy();
        if devices.trim().is_empty() || devices.trim() == "-1" {
            return false;
        }
    }

    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| {
        ["nvidia-smi", "nvidia-smi.exe"]
            .iter()
            .any(|bin| Path::new(&dir).join(bin).is_file())
    })
}
