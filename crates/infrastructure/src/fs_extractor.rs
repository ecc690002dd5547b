use async_trait::async_trait;
use chrono::{DateTime, Utc};
use extraction_core::{ExtractionError, Metadata, MetadataExtractor};
use serde_json::json;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// 基于文件系统属性的提取器
///
/// 只读取 `stat` 信息（大小、修改时间、扩展名），不解析文件内容。
/// 命令行的 `run` 子命令使用它，格式相关的提取器由外部服务提供。
#[derive(Debug, Default, Clone)]
pub struct FileStatExtractor;

impl FileStatExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetadataExtractor for FileStatExtractor {
    async fn extract(&self, file_path: &str) -> Result<Metadata, ExtractionError> {
        let meta = tokio::fs::metadata(file_path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ExtractionError::FileNotFound {
                    path: file_path.to_string(),
                }
            } else {
                ExtractionError::from(e)
            }
        })?;

        if !meta.is_file() {
            return Err(ExtractionError::UnsupportedFormat {
                format: "directory".to_string(),
            });
        }

        let path = Path::new(file_path);
        let mut metadata = Metadata::new();
        metadata.insert("file_path".to_string(), json!(file_path));
        metadata.insert(
            "file_name".to_string(),
            json!(path.file_name().and_then(|n| n.to_str())),
        );
        metadata.insert(
            "extension".to_string(),
            json!(path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)),
        );
        metadata.insert("file_size".to_string(), json!(meta.len()));
        metadata.insert("readonly".to_string(), json!(meta.permissions().readonly()));

        if let Ok(modified) = meta.modified() {
            let modified: DateTime<Utc> = modified.into();
            metadata.insert("modified".to_string(), json!(modified.to_rfc3339()));
        }

        debug!("提取文件属性完成: {} ({} 字节)", file_path, meta.len());
        Ok(metadata)
    }

    fn name(&self) -> &str {
        "file_stat"
    }
}
