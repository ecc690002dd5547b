//! Test data builders for creating test entities
//!
//! Builder patterns with sensible defaults and easy customization.

use chrono::{Duration, Utc};
use extraction_core::{DistributedTask, ExecutionHints, WorkerNode, WorkerStatus};

/// Builder for creating test DistributedTask entities
pub struct TaskBuilder {
    task: DistributedTask,
}

impl TaskBuilder {
    pub fn new(file_path: &str) -> Self {
        Self {
            task: DistributedTask::new(file_path),
        }
    }

    pub fn with_id(mut self, task_id: &str) -> Self {
        self.task.task_id = task_id.to_string();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.task.max_retries = max_retries;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.task.retries = retries;
        self
    }

    pub fn with_hints(mut self, chunk_size: u64, expected_time: f64, complexity: f64) -> Self {
        self.task.hints = Some(ExecutionHints {
            chunk_size,
            expected_time,
            complexity,
        });
        self
    }

    pub fn build(self) -> DistributedTask {
        self.task
    }
}

/// Builder for creating test WorkerNode entities
pub struct WorkerNodeBuilder {
    worker: WorkerNode,
}

impl WorkerNodeBuilder {
    pub fn new(worker_id: &str) -> Self {
        Self {
            worker: WorkerNode::new(worker_id, "localhost", 5000),
        }
    }

    pub fn with_address(mut self, hostname: &str, port: u16) -> Self {
        self.worker.hostname = hostname.to_string();
        self.worker.port = port;
        self
    }

    pub fn with_status(mut self, status: WorkerStatus) -> Self {
        self.worker.status = status;
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.worker = self.worker.with_capacity(capacity);
        self
    }

    pub fn with_current_task(mut self, task_id: &str) -> Self {
        self.worker.current_task = Some(task_id.to_string());
        self.worker.status = WorkerStatus::Busy;
        self
    }

    /// Backdate the last heartbeat so the worker looks stale
    pub fn with_heartbeat_age(mut self, seconds: i64) -> Self {
        self.worker.last_heartbeat = Utc::now() - Duration::seconds(seconds);
        self
    }

    pub fn build(self) -> WorkerNode {
        self.worker
    }
}
