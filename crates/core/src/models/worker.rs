use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 心跳超时时间（秒），超过该时间未收到心跳的Worker视为不健康
pub const HEARTBEAT_TIMEOUT_SECONDS: i64 = 60;

/// Worker节点信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerNode {
    pub worker_id: String,
    pub hostname: String,
    pub port: u16,
    pub status: WorkerStatus,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub current_task: Option<String>,
    pub last_heartbeat: DateTime<Utc>,
    pub capacity: u32,
}

/// Worker状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkerStatus {
    #[serde(rename = "IDLE")]
    Idle,
    #[serde(rename = "BUSY")]
    Busy,
    #[serde(rename = "UNHEALTHY")]
    Unhealthy,
    #[serde(rename = "OFFLINE")]
    Offline,
}

impl WorkerNode {
    /// 创建新的Worker，初始状态为空闲，容量为1
    pub fn new(worker_id: impl Into<String>, hostname: impl Into<String>, port: u16) -> Self {
        Self {
            worker_id: worker_id.into(),
            hostname: hostname.into(),
            port,
            status: WorkerStatus::Idle,
            tasks_completed: 0,
            tasks_failed: 0,
            current_task: None,
            last_heartbeat: Utc::now(),
            capacity: 1,
        }
    }

    /// 设置Worker容量，至少为1
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// 检查Worker是否健康（默认心跳超时）
    pub fn is_healthy(&self) -> bool {
        self.is_healthy_within(HEARTBEAT_TIMEOUT_SECONDS)
    }

    /// 检查Worker在指定心跳超时内是否健康。已下线的Worker始终不健康。
    pub fn is_healthy_within(&self, timeout_seconds: i64) -> bool {
        if self.status == WorkerStatus::Offline {
            return false;
        }
        let elapsed_ms = (Utc::now() - self.last_heartbeat).num_milliseconds();
        elapsed_ms < timeout_seconds.saturating_mul(1000)
    }

    /// 获取Worker利用率，取值范围 [0, 1]
    pub fn utilization(&self) -> f64 {
        let occupied = if self.current_task.is_some() { 1.0 } else { 0.0 };
        occupied / self.capacity.max(1) as f64
    }

    /// 更新心跳时间，不健康的Worker恢复为空闲
    pub fn update_heartbeat(&mut self) {
        self.last_heartbeat = Utc::now();
        if self.status == WorkerStatus::Unhealthy {
            self.status = WorkerStatus::Idle;
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_worker_is_idle_and_healthy() {
        let worker = WorkerNode::new("worker_0", "localhost", 5000);
        assert_eq!(worker.status, WorkerStatus::Idle);
        assert_eq!(worker.capacity, 1);
        assert!(worker.is_healthy());
        assert_eq!(worker.address(), "localhost:5000");
    }

    #[test]
    fn test_stale_heartbeat_is_unhealthy() {
        let mut worker = WorkerNode::new("worker_0", "localhost", 5000);
        worker.last_heartbeat = Utc::now() - Duration::seconds(HEARTBEAT_TIMEOUT_SECONDS);
        assert!(!worker.is_healthy());

        worker.status = WorkerStatus::Unhealthy;
        worker.update_heartbeat();
        assert!(worker.is_healthy());
        assert_eq!(worker.status, WorkerStatus::Idle);
    }

    #[test]
    fn test_offline_worker_is_never_healthy() {
        let mut worker = WorkerNode::new("worker_0", "localhost", 5000);
        worker.status = WorkerStatus::Offline;
        assert!(!worker.is_healthy());
    }

    #[test]
    fn test_utilization_respects_capacity() {
        let mut worker = WorkerNode::new("worker_0", "localhost", 5000).with_capacity(4);
        assert_eq!(worker.utilization(), 0.0);

        worker.current_task = Some("dtask_1".to_string());
        assert_eq!(worker.utilization(), 0.25);

        let zero = WorkerNode::new("worker_1", "localhost", 5001).with_capacity(0);
        assert_eq!(zero.capacity, 1);
    }
}
