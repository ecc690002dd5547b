use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ExecutionHints;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub retry_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum MessageType {
    TaskDispatch(TaskDispatchMessage),
    TaskResult(TaskResultMessage),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDispatchMessage {
    pub task_id: String,
    pub file_path: String,
    pub worker_id: String,
    pub attempt: u32,
    pub hints: Option<ExecutionHints>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskResultMessage {
    pub task_id: String,
    pub worker_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub processing_time: f64,
}

impl Message {
    pub fn task_dispatch(message: TaskDispatchMessage) -> Self {
        let payload = serde_json::to_value(&message).unwrap_or(serde_json::Value::Null);
        Self {
            id: Uuid::new_v4().to_string(),
            message_type: MessageType::TaskDispatch(message),
            payload,
            timestamp: Utc::now(),
            retry_count: 0,
        }
    }

    pub fn task_result(message: TaskResultMessage) -> Self {
        let payload = serde_json::to_value(&message).unwrap_or(serde_json::Value::Null);
        Self {
            id: Uuid::new_v4().to_string(),
            message_type: MessageType::TaskResult(message),
            payload,
            timestamp: Utc::now(),
            retry_count: 0,
        }
    }

    pub fn increment_retry(&mut self) {
        self.retry_count += 1;
    }

    /// 消息类型名称
    pub fn kind(&self) -> &'static str {
        match self.message_type {
            MessageType::TaskDispatch(_) => "task_dispatch",
            MessageType::TaskResult(_) => "task_result",
        }
    }

    /// 消息关联的任务ID
    pub fn task_id(&self) -> &str {
        match &self.message_type {
            MessageType::TaskDispatch(m) => &m.task_id,
            MessageType::TaskResult(m) => &m.task_id,
        }
    }
}
