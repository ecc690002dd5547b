use async_trait::async_trait;
use extraction_core::{Message, MessageQueue, SchedulerError, SchedulerResult};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

/// 内存消息队列实现
///
/// 每个目的地一个FIFO，适用于单进程部署场景。`receive` 取出的消息
/// 在 `acknowledge` 之前记为处理中，可通过 `nack_message` 重新投递。
#[derive(Debug)]
pub struct InMemoryMessageQueue {
    state: Mutex<QueueState>,
    /// 新消息到达时唤醒等待中的接收者
    notify: Notify,
    config: InMemoryQueueConfig,
}

#[derive(Debug, Default)]
struct QueueState {
    queues: HashMap<String, VecDeque<Message>>,
    in_flight: HashMap<String, InFlightMessage>,
}

#[derive(Debug)]
struct InFlightMessage {
    destination: String,
    message: Message,
    received_at: Instant,
}

#[derive(Debug, Clone)]
pub struct InMemoryQueueConfig {
    /// 单个目的地的最大消息数（0表示无限制）
    pub max_queue_size: usize,
    /// 接收等待时的轮询间隔（毫秒）
    pub poll_interval_ms: u64,
}

impl Default for InMemoryQueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10000,
            poll_interval_ms: 50,
        }
    }
}

/// 队列统计信息
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub total_queues: usize,
    pub total_messages: usize,
    pub in_flight: usize,
    pub oldest_in_flight: Option<Duration>,
}

impl Default for InMemoryMessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageQueue {
    /// 创建新的内存消息队列实例
    pub fn new() -> Self {
        Self::with_config(InMemoryQueueConfig::default())
    }

    /// 使用指定配置创建内存消息队列实例
    pub fn with_config(config: InMemoryQueueConfig) -> Self {
        debug!("Creating in-memory message queue with config: {:?}", config);
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            config,
        }
    }

    /// 拒绝消息；`requeue` 为真时放回原目的地队首并递增重试计数
    pub async fn nack_message(&self, message_id: &str, requeue: bool) -> SchedulerResult<()> {
        let mut state = self.state.lock().await;
        let Some(in_flight) = state.in_flight.remove(message_id) else {
            warn!("Nack for unknown message: {}", message_id);
            return Ok(());
        };

        if requeue {
            let mut message = in_flight.message;
            message.increment_retry();
            state
                .queues
                .entry(in_flight.destination.clone())
                .or_default()
                .push_front(message);
            drop(state);
            self.notify.notify_waiters();
            debug!(
                "Message {} requeued to '{}'",
                message_id, in_flight.destination
            );
        } else {
            info!("Message {} dropped after nack", message_id);
        }

        Ok(())
    }

    /// 把某个目的地所有未确认的消息重新投递，返回重新投递的数量
    pub async fn requeue_unacknowledged(&self, destination: &str) -> usize {
        let mut state = self.state.lock().await;
        let ids: Vec<String> = state
            .in_flight
            .iter()
            .filter(|(_, m)| m.destination == destination)
            .map(|(id, _)| id.clone())
            .collect();

        let mut pending: Vec<InFlightMessage> = ids
            .iter()
            .filter_map(|id| state.in_flight.remove(id))
            .collect();
        pending.sort_by_key(|m| m.received_at);

        let queue = state.queues.entry(destination.to_string()).or_default();
        for in_flight in pending.into_iter().rev() {
            let mut message = in_flight.message;
            message.increment_retry();
            queue.push_front(message);
        }
        drop(state);

        if !ids.is_empty() {
            self.notify.notify_waiters();
            info!(
                "Requeued {} unacknowledged messages to '{}'",
                ids.len(),
                destination
            );
        }
        ids.len()
    }

    /// 获取队列统计信息
    pub async fn get_queue_stats(&self) -> QueueStats {
        let state = self.state.lock().await;
        QueueStats {
            total_queues: state.queues.len(),
            total_messages: state.queues.values().map(VecDeque::len).sum(),
            in_flight: state.in_flight.len(),
            oldest_in_flight: state
                .in_flight
                .values()
                .map(|m| m.received_at.elapsed())
                .max(),
        }
    }

    /// 清空目的地中待接收的消息
    pub async fn purge_queue(&self, destination: &str) {
        let mut state = self.state.lock().await;
        if let Some(queue) = state.queues.get_mut(destination) {
            let purged = queue.len();
            queue.clear();
            debug!("Purged {} messages from '{}'", purged, destination);
        }
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    async fn send(&self, destination: &str, message: Message) -> SchedulerResult<()> {
        let mut state = self.state.lock().await;
        let queue = state.queues.entry(destination.to_string()).or_default();

        if self.config.max_queue_size > 0 && queue.len() >= self.config.max_queue_size {
            return Err(SchedulerError::MessageQueue(format!(
                "Queue '{}' is full ({} messages)",
                destination,
                queue.len()
            )));
        }

        debug!(
            "Message {} ({}) sent to '{}'",
            message.id,
            message.kind(),
            destination
        );
        queue.push_back(message);
        drop(state);

        self.notify.notify_waiters();
        Ok(())
    }

    async fn receive(
        &self,
        destination: &str,
        timeout: Duration,
    ) -> SchedulerResult<Option<Message>> {
        let deadline = Instant::now() + timeout;
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms.max(1));

        loop {
            {
                let mut state = self.state.lock().await;
                let next = state
                    .queues
                    .get_mut(destination)
                    .and_then(VecDeque::pop_front);

                if let Some(message) = next {
                    state.in_flight.insert(
                        message.id.clone(),
                        InFlightMessage {
                            destination: destination.to_string(),
                            message: message.clone(),
                            received_at: Instant::now(),
                        },
                    );
                    return Ok(Some(message));
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            let _ = tokio::time::timeout(remaining.min(poll_interval), self.notify.notified()).await;
        }
    }

    async fn acknowledge(&self, message_id: &str) -> SchedulerResult<()> {
        let mut state = self.state.lock().await;
        if state.in_flight.remove(message_id).is_none() {
            warn!("Acknowledge for unknown message: {}", message_id);
        }
        Ok(())
    }

    async fn queue_size(&self, destination: &str) -> SchedulerResult<usize> {
        let state = self.state.lock().await;
        Ok(state.queues.get(destination).map_or(0, VecDeque::len))
    }
}
