use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 提取回调返回的元数据映射
pub type Metadata = HashMap<String, serde_json::Value>;

/// 任务终态结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistributedResult {
    pub task_id: String,
    pub worker_id: String,
    pub success: bool,
    pub metadata: Metadata,
    pub error: Option<String>,
    pub processing_time: f64,
    pub timestamp: DateTime<Utc>,
}

impl DistributedResult {
    /// 构造成功结果
    pub fn success(
        task_id: impl Into<String>,
        worker_id: impl Into<String>,
        metadata: Metadata,
        processing_time: f64,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            worker_id: worker_id.into(),
            success: true,
            metadata,
            error: None,
            processing_time,
            timestamp: Utc::now(),
        }
    }

    /// 构造失败结果，保留原始错误信息
    pub fn failure(
        task_id: impl Into<String>,
        worker_id: impl Into<String>,
        error: impl Into<String>,
        processing_time: f64,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            worker_id: worker_id.into(),
            success: false,
            metadata: Metadata::new(),
            error: Some(error.into()),
            processing_time,
            timestamp: Utc::now(),
        }
    }
}
