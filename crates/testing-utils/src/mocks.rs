//! Mock implementations of the extractor and message queue traits

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use extraction_core::{
    ExtractionError, Message, MessageQueue, Metadata, MetadataExtractor, SchedulerError,
    SchedulerResult,
};
use serde_json::json;

#[derive(Debug, Clone)]
enum Behavior {
    Succeed,
    Fail(String),
    /// Fail the first N attempts for every path, then succeed
    FailTimes(usize),
    /// Fail only for the listed paths
    FailPaths(HashSet<String>),
}

/// Mock implementation of MetadataExtractor for testing
///
/// Successful calls return `{"path": <file_path>, "attempt": <n>}`.
#[derive(Debug, Clone)]
pub struct MockExtractor {
    behavior: Behavior,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    calls_by_path: Arc<Mutex<HashMap<String, usize>>>,
    call_order: Arc<Mutex<Vec<String>>>,
}

impl MockExtractor {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            calls_by_path: Arc::new(Mutex::new(HashMap::new())),
            call_order: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_behavior(Behavior::Succeed)
    }

    pub fn failing(message: &str) -> Self {
        Self::with_behavior(Behavior::Fail(message.to_string()))
    }

    pub fn failing_times(times: usize) -> Self {
        Self::with_behavior(Behavior::FailTimes(times))
    }

    pub fn failing_paths(paths: &[&str]) -> Self {
        Self::with_behavior(Behavior::FailPaths(
            paths.iter().map(|p| p.to_string()).collect(),
        ))
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, file_path: &str) -> usize {
        self.calls_by_path
            .lock()
            .unwrap()
            .get(file_path)
            .copied()
            .unwrap_or(0)
    }

    /// Paths in the order they were extracted
    pub fn call_order(&self) -> Vec<String> {
        self.call_order.lock().unwrap().clone()
    }
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::succeeding()
    }
}

#[async_trait]
impl MetadataExtractor for MockExtractor {
    async fn extract(&self, file_path: &str) -> Result<Metadata, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_order.lock().unwrap().push(file_path.to_string());
        let attempt = {
            let mut by_path = self.calls_by_path.lock().unwrap();
            let count = by_path.entry(file_path.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let fail = match &self.behavior {
            Behavior::Succeed => None,
            Behavior::Fail(message) => Some(message.clone()),
            Behavior::FailTimes(times) if attempt <= *times => {
                Some(format!("transient failure {attempt}"))
            }
            Behavior::FailTimes(_) => None,
            Behavior::FailPaths(paths) if paths.contains(file_path) => {
                Some(format!("cannot parse {file_path}"))
            }
            Behavior::FailPaths(_) => None,
        };

        match fail {
            Some(message) => Err(ExtractionError::Failed(message)),
            None => {
                let mut metadata = Metadata::new();
                metadata.insert("path".to_string(), json!(file_path));
                metadata.insert("attempt".to_string(), json!(attempt));
                Ok(metadata)
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock implementation of MessageQueue for testing
///
/// Per-destination FIFO that records every sent message and acknowledgement.
#[derive(Debug, Clone, Default)]
pub struct RecordingMessageQueue {
    queues: Arc<Mutex<HashMap<String, VecDeque<Message>>>>,
    sent: Arc<Mutex<Vec<(String, Message)>>>,
    acked_messages: Arc<Mutex<Vec<String>>>,
    fail_sends: Arc<AtomicBool>,
}

impl RecordingMessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `send` fail
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn get_sent_messages(&self) -> Vec<(String, Message)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn get_sent_to(&self, destination: &str) -> Vec<Message> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(dest, _)| dest == destination)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn get_acked_messages(&self) -> Vec<String> {
        self.acked_messages.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.queues.lock().unwrap().clear();
        self.sent.lock().unwrap().clear();
        self.acked_messages.lock().unwrap().clear();
    }
}

#[async_trait]
impl MessageQueue for RecordingMessageQueue {
    async fn send(&self, destination: &str, message: Message) -> SchedulerResult<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(SchedulerError::MessageQueue(format!(
                "send to '{destination}' rejected"
            )));
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.clone()));
        self.queues
            .lock()
            .unwrap()
            .entry(destination.to_string())
            .or_default()
            .push_back(message);
        Ok(())
    }

    async fn receive(
        &self,
        destination: &str,
        _timeout: Duration,
    ) -> SchedulerResult<Option<Message>> {
        Ok(self
            .queues
            .lock()
            .unwrap()
            .get_mut(destination)
            .and_then(VecDeque::pop_front))
    }

    async fn acknowledge(&self, message_id: &str) -> SchedulerResult<()> {
        self.acked_messages
            .lock()
            .unwrap()
            .push(message_id.to_string());
        Ok(())
    }

    async fn queue_size(&self, destination: &str) -> SchedulerResult<usize> {
        Ok(self
            .queues
            .lock()
            .unwrap()
            .get(destination)
            .map_or(0, VecDeque::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_times_recovers() {
        let extractor = MockExtractor::failing_times(2);
        assert!(extractor.extract("a").await.is_err());
        assert!(extractor.extract("a").await.is_err());
        let metadata = extractor.extract("a").await.unwrap();
        assert_eq!(metadata["attempt"], 3);
        assert!(extractor.extract("b").await.is_err());

        assert_eq!(extractor.call_count(), 4);
        assert_eq!(extractor.calls_for("a"), 3);
        assert_eq!(extractor.call_order(), vec!["a", "a", "a", "b"]);
    }

    #[tokio::test]
    async fn test_failing_paths() {
        let extractor = MockExtractor::failing_paths(&["bad.dcm"]);
        assert!(extractor.extract("good.jpg").await.is_ok());
        let err = extractor.extract("bad.dcm").await.unwrap_err();
        assert!(err.to_string().contains("bad.dcm"));
    }

    #[tokio::test]
    async fn test_recording_queue() {
        let mq = RecordingMessageQueue::new();
        let message = Message::task_result(extraction_core::TaskResultMessage {
            task_id: "t1".to_string(),
            worker_id: "w".to_string(),
            success: true,
            error: None,
            processing_time: 0.0,
        });
        mq.send("results", message.clone()).await.unwrap();
        assert_eq!(mq.queue_size("results").await.unwrap(), 1);
        assert_eq!(mq.get_sent_to("results").len(), 1);

        let received = mq
            .receive("results", Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        mq.acknowledge(&received.id).await.unwrap();
        assert_eq!(mq.get_acked_messages(), vec![message.id]);

        mq.set_fail_sends(true);
        assert!(mq.send("results", received).await.is_err());
    }
}
