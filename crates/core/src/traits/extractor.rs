//! 元数据提取器接口定义
//!
//! 具体格式的提取器（图像、视频、科学数据等）不属于调度层，
//! 调度器只通过 [`MetadataExtractor`] 调用它们。
//!
//! ## 使用示例
//!
//! ```rust
//! use extraction_core::traits::{FnExtractor, MetadataExtractor};
//! use extraction_core::models::Metadata;
//!
//! let extractor = FnExtractor::new("echo", |path: &str| {
//!     let mut metadata = Metadata::new();
//!     metadata.insert("path".to_string(), serde_json::json!(path));
//!     Ok(metadata)
//! });
//! assert_eq!(extractor.name(), "echo");
//! ```

use async_trait::async_trait;

use crate::{models::Metadata, ExtractionError};

/// 元数据提取器
///
/// 从调度器的角度看调用是同步完成的：调度循环会等待 `extract` 返回
/// 后才处理下一个任务。超时和取消由实现自行负责。
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// 提取指定文件的元数据
    async fn extract(&self, file_path: &str) -> Result<Metadata, ExtractionError>;

    /// 提取器名称
    fn name(&self) -> &str {
        "extractor"
    }
}

/// 把普通闭包适配为提取器
pub struct FnExtractor<F> {
    name: String,
    func: F,
}

impl<F> FnExtractor<F>
where
    F: Fn(&str) -> Result<Metadata, ExtractionError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> MetadataExtractor for FnExtractor<F>
where
    F: Fn(&str) -> Result<Metadata, ExtractionError> + Send + Sync,
{
    async fn extract(&self, file_path: &str) -> Result<Metadata, ExtractionError> {
        (self.func)(file_path)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
