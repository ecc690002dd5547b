//! # 数据模型
//!
//! 定义提取调度层的核心数据结构：Worker节点、提取任务、提取结果、
//! 聚合指标以及消息队列中传递的消息。
//!
//! ## 核心模型
//!
//! ### WorkerNode - 逻辑Worker
//! 调度器跟踪的执行槽位，用于负载感知的分发和统计，
//! 不一定对应真实的进程或线程。
//!
//! ### DistributedTask - 提取任务
//! 一个任务对应一个文件的元数据提取。`task_id` 不可变，
//! 其余字段是可变的调度状态（重试次数、分配的Worker、时间戳）。
//!
//! ### DistributedResult - 提取结果
//! 每个任务的终态记录：成功，或重试耗尽后的失败。
//!
//! ### DistributedMetrics - 聚合指标
//! 任务计数、成功率以及每个Worker的统计。
//!
//! ## 任务状态流转
//! ```text
//! Queued → Assigned → Completed
//!            ↓    ↘
//!         Queued   Failed
//!        (重试)    (重试耗尽)
//! ```
//!
//! ## Worker状态流转
//! ```text
//! Idle ⇄ Busy → Unhealthy → Idle (心跳恢复)
//!   ↘                ↘
//!   Offline        Offline
//! ```
//!
//! 所有模型都实现了 `serde` 序列化，时间字段统一使用 `DateTime<Utc>`，
//! 耗时字段统一为秒（`f64`）。

pub mod message;
pub mod metrics;
pub mod result;
pub mod task;
pub mod worker;

pub use message::*;
pub use metrics::*;
pub use result::*;
pub use task::*;
pub use worker::*;
