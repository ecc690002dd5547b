//! 文件元数据提取的分布式调度与自适应优化层
//!
//! 命令行程序的装配部分：按 [`AppConfig`](extraction_core::AppConfig)
//! 创建协调器和优化层，提供 `plan` 与 `run` 两种操作。

pub mod app;

pub use app::{Application, RunReport, CACHE_WORKER_ID};
