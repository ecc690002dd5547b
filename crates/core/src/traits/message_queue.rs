use std::time::Duration;

use async_trait::async_trait;

use crate::{models::Message, SchedulerResult};

/// 消息队列抽象接口
///
/// 每个目的地（destination）是一个独立的FIFO。实现需要保证每个目的地
/// 至少一次投递：`receive` 取出的消息在 `acknowledge` 之前视为处理中。
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// 发送消息到指定目的地
    async fn send(&self, destination: &str, message: Message) -> SchedulerResult<()>;

    /// 从指定目的地接收一条消息，超时返回 `None`
    async fn receive(&self, destination: &str, timeout: Duration)
        -> SchedulerResult<Option<Message>>;

    /// 确认消息处理完成
    async fn acknowledge(&self, message_id: &str) -> SchedulerResult<()>;

    /// 获取目的地中待接收的消息数量
    async fn queue_size(&self, destination: &str) -> SchedulerResult<usize>;
}
