use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 默认最大重试次数
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// 提取任务
///
/// 表示一个文件的元数据提取工作单元。
///
/// # 字段说明
///
/// - `task_id`: 任务唯一标识，形如 `dtask_<毫秒时间戳>_<8位十六进制>`
/// - `file_path`: 待提取的文件路径
/// - `priority`: 优先级，数值越大越先执行
/// - `retries`: 已重试次数，始终不超过 `max_retries`
/// - `assigned_worker`: 当前分配的Worker
/// - `hints`: 优化层给出的执行提示（分块大小、预计耗时、复杂度）
///
/// # 使用示例
///
/// ```rust
/// use extraction_core::models::DistributedTask;
///
/// let task = DistributedTask::new("/data/scan.dcm")
///     .with_priority(5)
///     .with_max_retries(1);
/// assert!(task.task_id.starts_with("dtask_"));
/// assert!(task.can_retry());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistributedTask {
    pub task_id: String,
    pub file_path: String,
    pub priority: i32,
    pub retries: u32,
    pub max_retries: u32,
    pub assigned_worker: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub hints: Option<ExecutionHints>,
}

/// 执行提示
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExecutionHints {
    pub chunk_size: u64,
    pub expected_time: f64,
    pub complexity: f64,
}

/// 任务状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskState {
    #[serde(rename = "QUEUED")]
    Queued,
    #[serde(rename = "ASSIGNED")]
    Assigned,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// 生成任务ID：`dtask_<epoch_ms>_<8-hex>`
///
/// 时间前缀使同一优先级内的字典序近似等于提交顺序。
pub fn generate_task_id() -> String {
    format!(
        "dtask_{}_{:08x}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}

impl DistributedTask {
    /// 创建新任务，使用自动生成的ID
    pub fn new(file_path: impl Into<String>) -> Self {
        Self::with_id(generate_task_id(), file_path)
    }

    /// 使用指定ID创建任务
    pub fn with_id(task_id: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            file_path: file_path.into(),
            priority: 0,
            retries: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            assigned_worker: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            hints: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_hints(mut self, hints: ExecutionHints) -> Self {
        self.hints = Some(hints);
        self
    }

    /// 检查任务是否还能重试
    pub fn can_retry(&self) -> bool {
        self.retries < self.max_retries
    }

    /// 标记一次重试：递增重试次数并清除分配信息
    pub fn mark_retry(&mut self) {
        debug_assert!(self.can_retry());
        self.retries = (self.retries + 1).min(self.max_retries);
        self.assigned_worker = None;
        self.started_at = None;
    }

    /// 标记任务开始在指定Worker上执行
    pub fn mark_started(&mut self, worker_id: &str) {
        self.assigned_worker = Some(worker_id.to_string());
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.completed_at = Some(Utc::now());
    }
}
