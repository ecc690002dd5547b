//! Metrics collector for the extraction scheduler
//!
//! Thin wrapper over the `metrics` facade. Without an installed recorder every
//! call is a no-op, so libraries and tests can use it unconditionally.

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use tracing::debug;

/// Metrics collector for the extraction scheduler
#[derive(Clone)]
pub struct MetricsCollector {
    // Task metrics
    tasks_submitted_total: Counter,
    tasks_succeeded_total: Counter,
    tasks_failed_total: Counter,
    task_retries_total: Counter,
    extraction_duration: Histogram,

    // Scheduling metrics
    queue_depth: Gauge,
    healthy_workers: Gauge,
    no_worker_backoffs_total: Counter,

    // Cache metrics
    cache_hits_total: Counter,
    cache_misses_total: Counter,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            tasks_submitted_total: counter!("extraction_tasks_submitted_total"),
            tasks_succeeded_total: counter!("extraction_tasks_succeeded_total"),
            tasks_failed_total: counter!("extraction_tasks_failed_total"),
            task_retries_total: counter!("extraction_task_retries_total"),
            extraction_duration: histogram!("extraction_duration_seconds"),
            queue_depth: gauge!("extraction_queue_depth"),
            healthy_workers: gauge!("extraction_healthy_workers"),
            no_worker_backoffs_total: counter!("extraction_no_worker_backoffs_total"),
            cache_hits_total: counter!("extraction_cache_hits_total"),
            cache_misses_total: counter!("extraction_cache_misses_total"),
        }
    }

    // Task metrics

    pub fn record_task_submitted(&self) {
        self.tasks_submitted_total.increment(1);
    }

    /// Record a successful extraction attempt
    pub fn record_task_success(&self, worker_id: &str, duration_seconds: f64) {
        self.tasks_succeeded_total.increment(1);
        self.extraction_duration.record(duration_seconds);

        debug!(
            worker_id = worker_id,
            duration_seconds = duration_seconds,
            "Extraction succeeded"
        );
    }

    /// Record a task that failed terminally after exhausting its retries
    pub fn record_task_failure(&self, worker_id: &str, duration_seconds: f64) {
        self.tasks_failed_total.increment(1);
        self.extraction_duration.record(duration_seconds);

        debug!(
            worker_id = worker_id,
            duration_seconds = duration_seconds,
            "Extraction failed"
        );
    }

    pub fn record_task_retry(&self, retry_count: u32) {
        self.task_retries_total.increment(1);
        debug!(retry_count = retry_count, "Task retry scheduled");
    }

    // Scheduling metrics

    pub fn update_queue_depth(&self, depth: usize) {
        self.queue_depth.set(depth as f64);
    }

    pub fn update_healthy_workers(&self, count: usize) {
        self.healthy_workers.set(count as f64);
    }

    pub fn record_no_worker_backoff(&self) {
        self.no_worker_backoffs_total.increment(1);
    }

    // Cache metrics

    pub fn record_cache_lookup(&self, hit: bool) {
        if hit {
            self.cache_hits_total.increment(1);
        } else {
            self.cache_misses_total.increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let collector = MetricsCollector::new();
        collector.record_task_submitted();
        collector.record_task_success("worker_0", 0.1);
        collector.record_task_failure("worker_1", 0.2);
        collector.record_task_retry(1);
        collector.update_queue_depth(3);
        collector.update_healthy_workers(2);
        collector.record_no_worker_backoff();
        collector.record_cache_lookup(true);
        collector.record_cache_lookup(false);
    }
}
