use thiserror::Error;

/// 调度器错误类型定义
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Worker未找到: {id}")]
    WorkerNotFound { id: String },

    #[error("任务未找到: {id}")]
    TaskNotFound { id: String },

    #[error("消息队列错误: {0}")]
    MessageQueue(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("任务执行错误: {0}")]
    TaskExecution(#[from] ExtractionError),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}

/// 元数据提取错误
///
/// 由外部提供的提取回调返回。调度器只关心它能否被转成可读字符串，
/// 最终失败结果中保留的就是 `to_string()` 的内容。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("不支持的文件格式: {format}")]
    UnsupportedFormat { format: String },

    #[error("IO错误: {0}")]
    Io(String),

    #[error("提取超时: {seconds}秒")]
    Timeout { seconds: u64 },

    #[error("提取失败: {0}")]
    Failed(String),
}

impl ExtractionError {
    pub fn failed(message: impl Into<String>) -> Self {
        ExtractionError::Failed(message.into())
    }
}

impl From<std::io::Error> for ExtractionError {
    fn from(err: std::io::Error) -> Self {
        ExtractionError::Io(err.to_string())
    }
}

/// 统一的Result类型
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
