use std::sync::Arc;
use std::time::Duration;

use extraction_core::{
    CoordinatorConfig, DispatchStrategyKind, MessageQueue, MessageType, TaskState,
};
use extraction_dispatcher::{
    extract_distributed, run_batch, DistributedCoordinator, RESULTS_DESTINATION,
};
use extraction_infrastructure::{InMemoryMessageQueue, InMemoryQueueConfig};
use extraction_optimizer::OptimizationEngine;
use extraction_testing_utils::{
    FileFixture, MockExtractor, RecordingMessageQueue, TaskBuilder, TestEnv,
};

fn test_config() -> CoordinatorConfig {
    CoordinatorConfig {
        queue_wait_ms: 20,
        no_worker_backoff_ms: 20,
        ..Default::default()
    }
}

fn coordinator_with(config: CoordinatorConfig) -> Arc<DistributedCoordinator> {
    Arc::new(DistributedCoordinator::with_config(
        config,
        Arc::new(InMemoryMessageQueue::new()),
    ))
}

#[tokio::test]
async fn test_two_workers_all_succeed() {
    let coordinator = coordinator_with(test_config());
    coordinator.register_worker("worker_0", "localhost", 5000).await;
    coordinator.register_worker("worker_1", "localhost", 5001).await;
    coordinator.add_tasks_batch(&["a.dcm", "b.jpg"]).await;

    let extractor = MockExtractor::succeeding().with_delay(Duration::from_millis(10));
    let (results, metrics) = coordinator.process_tasks(&extractor).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success));
    assert!(results.iter().all(|r| r.processing_time >= 0.01));
    assert_eq!(metrics.success_rate(), 100.0);
    assert_eq!(metrics.completed_tasks, 2);
    assert_eq!(coordinator.queue_len().await, 0);
    assert!(!coordinator.is_running());
}

#[tokio::test]
async fn test_exhausted_retries_yield_one_failure_per_task() {
    let coordinator = coordinator_with(CoordinatorConfig {
        default_max_retries: 1,
        ..test_config()
    });
    coordinator.register_worker("worker_0", "localhost", 5000).await;
    coordinator.register_worker("worker_1", "localhost", 5001).await;
    let ids = coordinator
        .add_tasks_batch(&["a.dcm", "b.jpg", "c.fits"])
        .await;

    let extractor = MockExtractor::failing("unreadable");
    let (results, metrics) = coordinator.process_tasks(&extractor).await;

    // two attempts per task
    assert_eq!(extractor.call_count(), 6);
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| !r.success));
    assert!(results
        .iter()
        .all(|r| r.error.as_deref().unwrap_or_default().contains("unreadable")));
    for id in &ids {
        assert_eq!(results.iter().filter(|r| &r.task_id == id).count(), 1);
        assert_eq!(coordinator.get_task_state(id).await, Some(TaskState::Failed));
    }

    let workers = coordinator.get_workers().await;
    let total_failed: u64 = workers.iter().map(|w| w.tasks_failed).sum();
    assert_eq!(total_failed, 3);
    for worker in &workers {
        let held_last = results
            .iter()
            .filter(|r| r.worker_id == worker.worker_id)
            .count() as u64;
        assert_eq!(worker.tasks_failed, held_last);
    }

    assert_eq!(metrics.failed_tasks, 3);
    assert_eq!(metrics.retried_attempts, 3);
    assert_eq!(
        metrics.completed_tasks,
        metrics.successful_tasks + metrics.failed_tasks
    );
}

#[tokio::test]
async fn test_mixed_outcomes_keep_counters_consistent() {
    let coordinator = coordinator_with(test_config());
    coordinator.register_worker("worker_0", "localhost", 5000).await;
    coordinator
        .add_tasks_batch(&["ok1.jpg", "bad.dcm", "ok2.pdf", "bad.fits"])
        .await;

    let extractor = MockExtractor::failing_paths(&["bad.dcm", "bad.fits"]);
    let (results, metrics) = coordinator.process_tasks(&extractor).await;

    assert_eq!(results.len(), 4);
    assert_eq!(metrics.successful_tasks, 2);
    assert_eq!(metrics.failed_tasks, 2);
    assert_eq!(metrics.completed_tasks, 4);
    assert_eq!(metrics.success_rate(), 50.0);
    // default of three retries: four attempts per failing file
    assert_eq!(extractor.calls_for("bad.dcm"), 4);

    let stats = &metrics.worker_stats["worker_0"];
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.failed, 2);
}

#[tokio::test]
async fn test_higher_priority_runs_first() {
    let coordinator = coordinator_with(test_config());
    coordinator.register_worker("worker_0", "localhost", 5000).await;
    coordinator
        .add_task(TaskBuilder::new("low.jpg").with_id("t3").with_priority(0).build())
        .await;
    coordinator
        .add_task(TaskBuilder::new("urgent.jpg").with_id("t9").with_priority(10).build())
        .await;
    coordinator
        .add_task(TaskBuilder::new("also_low.jpg").with_id("t1").with_priority(0).build())
        .await;

    let extractor = MockExtractor::succeeding();
    coordinator.process_tasks(&extractor).await;

    assert_eq!(
        extractor.call_order(),
        vec!["urgent.jpg", "also_low.jpg", "low.jpg"]
    );
}

#[tokio::test]
async fn test_no_healthy_worker_keeps_task_queued() {
    let coordinator = coordinator_with(test_config());
    coordinator.register_worker("worker_0", "localhost", 5000).await;
    coordinator.mark_worker_offline("worker_0").await.unwrap();
    let id = coordinator
        .add_task(TaskBuilder::new("a.jpg").build())
        .await;

    let extractor = Arc::new(MockExtractor::succeeding());
    let handle = {
        let coordinator = coordinator.clone();
        let extractor = extractor.clone();
        tokio::spawn(async move { coordinator.process_tasks(extractor.as_ref()).await })
    };

    let watched = coordinator.clone();
    let started = TestEnv::wait_for(
        || {
            let watched = watched.clone();
            async move { watched.is_running() }
        },
        Duration::from_secs(2),
    )
    .await;
    assert!(started);
    tokio::time::sleep(Duration::from_millis(100)).await;
    coordinator.shutdown();
    let (results, metrics) = handle.await.unwrap();

    assert!(results.is_empty());
    assert_eq!(metrics.completed_tasks, 0);
    assert_eq!(extractor.call_count(), 0);
    assert_eq!(coordinator.queue_len().await, 1);
    assert_eq!(coordinator.get_task_state(&id).await, Some(TaskState::Queued));
}

#[tokio::test]
async fn test_worker_returning_mid_run_picks_up_work() {
    let coordinator = coordinator_with(test_config());
    coordinator.register_worker("worker_0", "localhost", 5000).await;
    coordinator.mark_worker_offline("worker_0").await.unwrap();
    coordinator.add_tasks_batch(&["a.jpg"]).await;

    let extractor = Arc::new(MockExtractor::succeeding());
    let handle = {
        let coordinator = coordinator.clone();
        let extractor = extractor.clone();
        tokio::spawn(async move { coordinator.process_tasks(extractor.as_ref()).await })
    };

    tokio::time::sleep(Duration::from_millis(60)).await;
    coordinator.heartbeat("worker_0").await.unwrap();

    let (results, _) = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].success);
}

#[tokio::test]
async fn test_shutdown_lets_in_flight_extraction_finish() {
    let coordinator = coordinator_with(test_config());
    coordinator.register_worker("worker_0", "localhost", 5000).await;
    coordinator.add_tasks_batch(&["a.jpg", "b.jpg", "c.jpg"]).await;

    let extractor = Arc::new(MockExtractor::succeeding().with_delay(Duration::from_millis(200)));
    let handle = {
        let coordinator = coordinator.clone();
        let extractor = extractor.clone();
        tokio::spawn(async move { coordinator.process_tasks(extractor.as_ref()).await })
    };

    let watched = extractor.clone();
    let in_flight = TestEnv::wait_for(
        || {
            let watched = watched.clone();
            async move { watched.call_count() == 1 }
        },
        Duration::from_secs(2),
    )
    .await;
    assert!(in_flight);
    coordinator.shutdown();
    let (results, metrics) = handle.await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(metrics.total_tasks, 3);
    assert_eq!(coordinator.queue_len().await, 2);
    assert!(coordinator.get_workers().await[0].current_task.is_none());
}

#[tokio::test]
async fn test_adaptive_strategy_processes_batch() {
    let coordinator = coordinator_with(CoordinatorConfig {
        dispatch_strategy: DispatchStrategyKind::Adaptive,
        ..test_config()
    });
    assert_eq!(coordinator.strategy_name(), "Adaptive");
    coordinator.register_worker("worker_0", "localhost", 5000).await;
    coordinator.register_worker("worker_1", "localhost", 5001).await;
    coordinator
        .add_tasks_batch(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"])
        .await;

    let extractor = MockExtractor::succeeding().with_delay(Duration::from_millis(5));
    let (results, metrics) = coordinator.process_tasks(&extractor).await;

    assert_eq!(results.len(), 4);
    assert_eq!(metrics.success_rate(), 100.0);
    let used: u64 = metrics.worker_stats.values().map(|s| s.completed).sum();
    assert_eq!(used, 4);
}

#[tokio::test]
async fn test_optimizer_hints_travel_with_dispatch() {
    let fixture = FileFixture::new();
    let scan = fixture.create("scan.dcm", 5 * 1024 * 1024);
    let photo = fixture.create("photo.jpg", 1024);

    let mq = Arc::new(RecordingMessageQueue::new());
    let coordinator = DistributedCoordinator::with_config(test_config(), mq.clone())
        .with_optimizer(OptimizationEngine::default());
    coordinator.register_worker("worker_0", "localhost", 5000).await;
    coordinator.add_tasks_batch(&[&scan, &photo]).await;

    coordinator.process_tasks(&MockExtractor::succeeding()).await;

    let dispatched = mq.get_sent_to("worker_0");
    assert_eq!(dispatched.len(), 2);
    let scan_hints = dispatched
        .iter()
        .find_map(|m| match &m.message_type {
            MessageType::TaskDispatch(d) if d.file_path == scan => d.hints,
            _ => None,
        })
        .unwrap();
    assert_eq!(scan_hints.chunk_size, 128 * 1024);
    assert_eq!(scan_hints.complexity, 0.9);
}

#[tokio::test]
async fn test_extract_distributed_registers_local_workers() {
    let extractor = MockExtractor::succeeding();
    let (results, metrics) = extract_distributed(&["a.dcm", "b.jpg", "c.pdf"], &extractor, 3).await;

    assert_eq!(results.len(), 3);
    assert_eq!(metrics.success_rate(), 100.0);
    assert!(metrics
        .worker_stats
        .keys()
        .all(|id| id.starts_with("worker_")));
}

#[tokio::test]
async fn test_run_batch_treats_zero_workers_as_one() {
    let coordinator = coordinator_with(test_config());
    let extractor = MockExtractor::succeeding();
    let empty: [&str; 0] = [];

    let (results, _) = run_batch(&coordinator, &empty, &extractor, 0).await;
    assert!(results.is_empty());

    let workers = coordinator.get_workers().await;
    assert_eq!(workers.len(), 1);
    assert_eq!(workers[0].worker_id, "worker_0");
    assert_eq!(workers[0].address(), "localhost:5000");
}

#[tokio::test]
async fn test_batch_larger_than_queue_cap_leaves_no_backlog() {
    let mq = Arc::new(InMemoryMessageQueue::with_config(InMemoryQueueConfig {
        max_queue_size: 5,
        ..Default::default()
    }));
    let coordinator = DistributedCoordinator::with_config(test_config(), mq.clone());
    coordinator.register_worker("worker_0", "localhost", 5000).await;
    let files: Vec<String> = (0..8).map(|i| format!("file_{i}.jpg")).collect();
    coordinator.add_tasks_batch(&files).await;

    let (results, metrics) = coordinator.process_tasks(&MockExtractor::succeeding()).await;

    assert_eq!(results.len(), 8);
    assert_eq!(metrics.successful_tasks, 8);
    assert_eq!(mq.queue_size(RESULTS_DESTINATION).await.unwrap(), 0);
    assert_eq!(mq.queue_size("worker_0").await.unwrap(), 0);
}
