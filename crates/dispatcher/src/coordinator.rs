use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Notify};
use tracing::{debug, error, info, warn};

use extraction_core::{
    generate_task_id, CoordinatorConfig, DistributedMetrics, DistributedResult, DistributedTask,
    ExtractionError, Message, MessageQueue, Metadata, MetadataExtractor, SchedulerError,
    SchedulerResult, TaskDispatchMessage, TaskResultMessage, TaskState, WorkerNode, WorkerStatus,
};
use extraction_infrastructure::MetricsCollector;
use extraction_optimizer::OptimizationEngine;

use crate::retry::RetryPolicy;
use crate::strategies::{create_strategy, least_utilized, DispatchStrategy};

/// 终态结果发布到的目的地
pub const RESULTS_DESTINATION: &str = "results";

/// 优先级队列元素：优先级高的先出，同优先级按task_id字典序
#[derive(Debug)]
struct QueuedTask(DistributedTask);

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.0.priority == other.0.priority && self.0.task_id == other.0.task_id
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // BinaryHeap是最大堆
        self.0
            .priority
            .cmp(&other.0.priority)
            .then_with(|| other.0.task_id.cmp(&self.0.task_id))
    }
}

#[derive(Debug, Default)]
struct CoordinatorState {
    /// 按注册顺序保存
    workers: Vec<WorkerNode>,
    queue: BinaryHeap<QueuedTask>,
    results: Vec<DistributedResult>,
    task_states: HashMap<String, TaskState>,
    metrics: DistributedMetrics,
}

impl CoordinatorState {
    fn worker_mut(&mut self, worker_id: &str) -> Option<&mut WorkerNode> {
        self.workers.iter_mut().find(|w| w.worker_id == worker_id)
    }

    fn push(&mut self, task: DistributedTask) {
        self.task_states
            .insert(task.task_id.clone(), TaskState::Queued);
        self.queue.push(QueuedTask(task));
    }
}

/// 一次提取尝试的结局
enum Outcome {
    Completed(DistributedResult),
    Retry(DistributedTask),
    Failed(DistributedResult),
}

/// 分布式任务协调器
///
/// 维护Worker注册表和任务优先级队列，单个调度循环依次取出任务、
/// 选择Worker、调用提取器并记录结果。Worker在这里是逻辑槽位，
/// 用于负载感知的选择和统计，提取调用本身在调度循环中完成。
///
/// 所有共享状态由一把锁保护，锁从不跨越提取调用持有；访问方法返回快照。
pub struct DistributedCoordinator {
    config: CoordinatorConfig,
    state: Mutex<CoordinatorState>,
    /// 新任务入队或停止时唤醒等待中的调度循环
    notify: Notify,
    running: AtomicBool,
    message_queue: Arc<dyn MessageQueue>,
    strategy: Arc<dyn DispatchStrategy>,
    retry_policy: RetryPolicy,
    metrics: MetricsCollector,
    optimizer: Option<OptimizationEngine>,
}

impl DistributedCoordinator {
    pub fn new(message_queue: Arc<dyn MessageQueue>) -> Self {
        Self::with_config(CoordinatorConfig::default(), message_queue)
    }

    pub fn with_config(config: CoordinatorConfig, message_queue: Arc<dyn MessageQueue>) -> Self {
        let strategy = create_strategy(config.dispatch_strategy);
        let retry_policy = RetryPolicy::new(config.retry.clone());

        info!(
            "创建协调器，调度策略: {}，重试退避: {}",
            strategy.name(),
            if retry_policy.is_enabled() { "启用" } else { "关闭" }
        );

        Self {
            config,
            state: Mutex::new(CoordinatorState::default()),
            notify: Notify::new(),
            running: AtomicBool::new(false),
            message_queue,
            strategy,
            retry_policy,
            metrics: MetricsCollector::new(),
            optimizer: None,
        }
    }

    /// 替换Worker选择策略
    pub fn with_strategy(mut self, strategy: Arc<dyn DispatchStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// 启用优化层：批量提交时附带执行提示，完成后反馈耗时
    pub fn with_optimizer(mut self, optimizer: OptimizationEngine) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    // ---- Worker注册表 ----

    /// 注册Worker，重复的ID会覆盖原有记录
    pub async fn register_worker(&self, worker_id: &str, hostname: &str, port: u16) {
        self.register_worker_with_capacity(worker_id, hostname, port, 1)
            .await
    }

    pub async fn register_worker_with_capacity(
        &self,
        worker_id: &str,
        hostname: &str,
        port: u16,
        capacity: u32,
    ) {
        let worker = WorkerNode::new(worker_id, hostname, port).with_capacity(capacity);
        let mut state = self.state.lock().await;
        match state.worker_mut(worker_id) {
            Some(existing) => {
                *existing = worker;
                info!("Worker {} 重新注册: {}:{}", worker_id, hostname, port);
            }
            None => {
                state.workers.push(worker);
                info!("Worker {} 注册成功: {}:{}", worker_id, hostname, port);
            }
        }
    }

    /// 刷新Worker心跳，不健康的Worker恢复为空闲
    pub async fn heartbeat(&self, worker_id: &str) -> SchedulerResult<()> {
        let mut state = self.state.lock().await;
        let worker = state
            .worker_mut(worker_id)
            .ok_or_else(|| SchedulerError::WorkerNotFound {
                id: worker_id.to_string(),
            })?;
        if worker.status == WorkerStatus::Offline {
            worker.status = WorkerStatus::Idle;
        }
        worker.update_heartbeat();
        debug!("Worker {} 心跳已更新", worker_id);
        Ok(())
    }

    /// 将Worker标记为下线，不再参与调度
    pub async fn mark_worker_offline(&self, worker_id: &str) -> SchedulerResult<()> {
        let mut state = self.state.lock().await;
        let worker = state
            .worker_mut(worker_id)
            .ok_or_else(|| SchedulerError::WorkerNotFound {
                id: worker_id.to_string(),
            })?;
        worker.status = WorkerStatus::Offline;
        warn!("Worker {} 已标记为下线", worker_id);
        Ok(())
    }

    pub async fn get_workers(&self) -> Vec<WorkerNode> {
        self.state.lock().await.workers.clone()
    }

    pub async fn get_healthy_workers(&self) -> Vec<WorkerNode> {
        let state = self.state.lock().await;
        self.healthy_workers(&state)
    }

    /// 利用率最低的健康Worker，没有健康Worker时返回 `None`
    pub async fn get_best_worker(&self) -> Option<WorkerNode> {
        let healthy = self.get_healthy_workers().await;
        least_utilized(&healthy).cloned()
    }

    fn healthy_workers(&self, state: &CoordinatorState) -> Vec<WorkerNode> {
        state
            .workers
            .iter()
            .filter(|w| w.is_healthy_within(self.config.heartbeat_timeout_seconds))
            .cloned()
            .collect()
    }

    // ---- 任务队列 ----

    /// 提交单个任务，返回任务ID
    pub async fn add_task(&self, task: DistributedTask) -> String {
        let task_id = task.task_id.clone();
        {
            let mut state = self.state.lock().await;
            state.metrics.total_tasks += 1;
            debug!("任务入队: {} ({}), 优先级 {}", task_id, task.file_path, task.priority);
            state.push(task);
            self.metrics.update_queue_depth(state.queue.len());
        }
        self.metrics.record_task_submitted();
        self.notify.notify_one();
        task_id
    }

    /// 批量提交文件，返回按提交顺序排列的任务ID
    pub async fn add_tasks_batch<S: AsRef<str>>(&self, file_paths: &[S]) -> Vec<String> {
        let mut task_ids = Vec::with_capacity(file_paths.len());
        for path in file_paths {
            let path = path.as_ref();
            let mut task = DistributedTask::with_id(generate_task_id(), path)
                .with_max_retries(self.config.default_max_retries);
            if let Some(optimizer) = &self.optimizer {
                task = task.with_hints(optimizer.execution_hints(path));
            }
            task_ids.push(self.add_task(task).await);
        }
        info!("批量提交 {} 个任务", task_ids.len());
        task_ids
    }

    pub async fn queue_len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    pub async fn get_task_state(&self, task_id: &str) -> Option<TaskState> {
        self.state.lock().await.task_states.get(task_id).copied()
    }

    pub async fn get_metrics(&self) -> DistributedMetrics {
        self.state.lock().await.metrics.clone()
    }

    pub async fn get_results(&self) -> Vec<DistributedResult> {
        self.state.lock().await.results.clone()
    }

    // ---- 调度循环 ----

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 停止调度循环。正在进行的提取调用不会被中断。
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("协调器收到停止信号");
        }
        self.notify.notify_one();
    }

    /// 运行调度循环，直到队列排空或被停止
    ///
    /// 返回迄今为止的全部终态结果和最终统计。提取器返回的错误
    /// 不会中断循环，只会进入重试或失败结果。
    pub async fn process_tasks(
        &self,
        extractor: &dyn MetadataExtractor,
    ) -> (Vec<DistributedResult>, DistributedMetrics) {
        self.running.store(true, Ordering::SeqCst);
        info!("调度循环启动，提取器: {}", extractor.name());

        let queue_wait = Duration::from_millis(self.config.queue_wait_ms);
        let no_worker_backoff = Duration::from_millis(self.config.no_worker_backoff_ms);

        while self.is_running() {
            let Some(mut task) = self.pop_task(queue_wait).await else {
                if self.is_running() {
                    debug!("任务队列已排空");
                }
                break;
            };

            let file_size = tokio::fs::metadata(&task.file_path)
                .await
                .map(|m| m.len())
                .unwrap_or(0);

            let Some(worker_id) = self.assign(&mut task, file_size).await else {
                warn!(
                    "没有可用的健康Worker，任务 {} 重新入队，等待 {:?}",
                    task.task_id, no_worker_backoff
                );
                self.requeue(task).await;
                self.metrics.record_no_worker_backoff();
                tokio::time::sleep(no_worker_backoff).await;
                continue;
            };

            self.dispatch_message(&task, &worker_id).await;

            let started = Instant::now();
            let extracted = extractor.extract(&task.file_path).await;
            let elapsed = started.elapsed().as_secs_f64();
            self.strategy.record_performance(&worker_id, elapsed);

            match self
                .complete_attempt(task, &worker_id, extracted, file_size, elapsed)
                .await
            {
                Outcome::Completed(result) | Outcome::Failed(result) => {
                    self.publish_result(&result).await;
                }
                Outcome::Retry(task) => {
                    let delay = self.retry_policy.delay_for(task.retries);
                    if !delay.is_zero() {
                        debug!("任务 {} 在 {:?} 后重试", task.task_id, delay);
                        tokio::time::sleep(delay).await;
                    }
                    self.requeue(task).await;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);

        let state = self.state.lock().await;
        info!(
            "调度循环结束: 完成 {}/{}，成功率 {:.1}%，剩余队列 {}",
            state.metrics.completed_tasks,
            state.metrics.total_tasks,
            state.metrics.success_rate(),
            state.queue.len()
        );
        (state.results.clone(), state.metrics.clone())
    }

    /// 取出优先级最高的任务；队列为空时最多等待 `wait`
    async fn pop_task(&self, wait: Duration) -> Option<DistributedTask> {
        let deadline = Instant::now() + wait;
        loop {
            if !self.is_running() {
                return None;
            }

            {
                let mut state = self.state.lock().await;
                if let Some(QueuedTask(task)) = state.queue.pop() {
                    self.metrics.update_queue_depth(state.queue.len());
                    return Some(task);
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let _ = tokio::time::timeout(remaining, self.notify.notified()).await;
        }
    }

    async fn requeue(&self, task: DistributedTask) {
        let mut state = self.state.lock().await;
        state.push(task);
        self.metrics.update_queue_depth(state.queue.len());
    }

    /// 选择Worker并标记为忙碌
    async fn assign(&self, task: &mut DistributedTask, file_size: u64) -> Option<String> {
        let mut state = self.state.lock().await;
        let healthy = self.healthy_workers(&state);
        self.metrics.update_healthy_workers(healthy.len());

        let worker_id = self
            .strategy
            .select_worker(task, file_size, &healthy)
            .filter(|id| healthy.iter().any(|w| &w.worker_id == id))?;

        let worker = state.worker_mut(&worker_id)?;
        worker.status = WorkerStatus::Busy;
        worker.current_task = Some(task.task_id.clone());

        task.mark_started(&worker_id);
        state
            .task_states
            .insert(task.task_id.clone(), TaskState::Assigned);

        debug!(
            "任务 {} 分配给Worker {} (第 {} 次尝试)",
            task.task_id,
            worker_id,
            task.retries + 1
        );
        Some(worker_id)
    }

    /// 通过消息队列把任务交给逻辑Worker，并代其接收和确认
    async fn dispatch_message(&self, task: &DistributedTask, worker_id: &str) {
        let message = Message::task_dispatch(TaskDispatchMessage {
            task_id: task.task_id.clone(),
            file_path: task.file_path.clone(),
            worker_id: worker_id.to_string(),
            attempt: task.retries,
            hints: task.hints,
        });

        if let Err(e) = self.message_queue.send(worker_id, message).await {
            warn!("发送任务 {} 的分发消息失败: {}", task.task_id, e);
            return;
        }

        match self.message_queue.receive(worker_id, Duration::ZERO).await {
            Ok(Some(received)) => {
                if let Err(e) = self.message_queue.acknowledge(&received.id).await {
                    warn!("确认消息 {} 失败: {}", received.id, e);
                }
            }
            Ok(None) => debug!("Worker {} 的分发消息未能立即取回", worker_id),
            Err(e) => warn!("接收Worker {} 的分发消息失败: {}", worker_id, e),
        }
    }

    /// 未开启 `publish_results` 时不发布
    async fn publish_result(&self, result: &DistributedResult) {
        if !self.config.publish_results {
            return;
        }

        let message = Message::task_result(TaskResultMessage {
            task_id: result.task_id.clone(),
            worker_id: result.worker_id.clone(),
            success: result.success,
            error: result.error.clone(),
            processing_time: result.processing_time,
        });

        if let Err(e) = self.message_queue.send(RESULTS_DESTINATION, message).await {
            warn!("发布任务 {} 的结果失败: {}", result.task_id, e);
        }
    }

    /// 记录一次尝试的结果并释放Worker
    async fn complete_attempt(
        &self,
        mut task: DistributedTask,
        worker_id: &str,
        extracted: Result<Metadata, ExtractionError>,
        file_size: u64,
        elapsed: f64,
    ) -> Outcome {
        // 优化层反馈在取锁之前完成
        let extracted = match (&self.optimizer, extracted) {
            (Some(optimizer), Ok(metadata)) => {
                optimizer.record_extraction(&task.file_path, file_size, elapsed);
                Ok(optimizer.finalize_metadata(&task.file_path, metadata))
            }
            (_, extracted) => extracted,
        };

        let mut state = self.state.lock().await;

        let outcome = match extracted {
            Ok(metadata) => {
                task.mark_completed();
                let result = DistributedResult::success(&task.task_id, worker_id, metadata, elapsed);
                state.metrics.record_success(worker_id, elapsed);
                if let Some(worker) = state.worker_mut(worker_id) {
                    worker.tasks_completed += 1;
                }
                state
                    .task_states
                    .insert(task.task_id.clone(), TaskState::Completed);
                state.results.push(result.clone());
                self.metrics.record_task_success(worker_id, elapsed);

                debug!("任务 {} 在Worker {} 上完成，耗时 {:.3}s", task.task_id, worker_id, elapsed);
                Outcome::Completed(result)
            }
            Err(e) if task.can_retry() => {
                task.mark_retry();
                state.metrics.retried_attempts += 1;
                state
                    .task_states
                    .insert(task.task_id.clone(), TaskState::Queued);
                self.metrics.record_task_retry(task.retries);

                warn!(
                    "任务 {} 在Worker {} 上失败: {}，重试 {}/{}",
                    task.task_id, worker_id, e, task.retries, task.max_retries
                );
                Outcome::Retry(task)
            }
            Err(e) => {
                task.mark_completed();
                let result =
                    DistributedResult::failure(&task.task_id, worker_id, e.to_string(), elapsed);
                state.metrics.record_failure(worker_id, elapsed);
                if let Some(worker) = state.worker_mut(worker_id) {
                    worker.tasks_failed += 1;
                }
                state
                    .task_states
                    .insert(task.task_id.clone(), TaskState::Failed);
                state.results.push(result.clone());
                self.metrics.record_task_failure(worker_id, elapsed);

                error!(
                    "任务 {} 重试 {} 次后最终失败: {}",
                    task.task_id, task.max_retries, e
                );
                Outcome::Failed(result)
            }
        };

        let timeout = self.config.heartbeat_timeout_seconds;
        if let Some(worker) = state.worker_mut(worker_id) {
            worker.current_task = None;
            if worker.status != WorkerStatus::Offline {
                worker.status = if worker.is_healthy_within(timeout) {
                    WorkerStatus::Idle
                } else {
                    WorkerStatus::Unhealthy
                };
            }
        }

        outcome
    }
}
