//! Integration tests for the Worker module

use super::*;
use crate::channel::{handoff, BatchReceiver};
use crate::client::{worker_path, RequestClient, RequestFailure};
use crate::error::LoadError;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock RequestClient
// ============================================================================

struct MockClient {
    delay: Option<Duration>,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

impl MockClient {
    fn new() -> Self {
        Self {
            delay: None,
            fail_on_call: None,
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the n-th call (1-based) with a 500
    fn with_fail_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn post(&self, path: &str) -> Result<(), RequestFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.paths.lock().unwrap().push(path.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on_call == Some(call) {
            return Err(RequestFailure::Status {
                status: 500,
                reason: "Internal Server Error".to_string(),
                method: "POST".to_string(),
                path: path.to_string(),
                body: "Simulated failure".to_string(),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn create_test_worker(
    id: usize,
    client: Arc<dyn RequestClient>,
    iterations: usize,
) -> (Worker, BatchReceiver) {
    let (batch_tx, batch_rx) = handoff(id);

    let worker = WorkerBuilder::new(id)
        .client(client)
        .iterations(iterations)
        .batch_tx(batch_tx)
        .build()
        .expect("Failed to build worker");

    (worker, batch_rx)
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_worker_runs_all_iterations() {
    let client = Arc::new(MockClient::new().with_delay(Duration::from_millis(100)));
    let (worker, batch_rx) = create_test_worker(1, client.clone(), 5);

    let stats = worker.run().await.expect("Worker failed");
    let batch = batch_rx.recv().await.expect("No batch received");

    assert_eq!(stats.completed, 5);
    assert!(stats.elapsed >= Duration::from_millis(500));
    assert_eq!(batch.len(), 5);
    assert_eq!(client.calls(), 5);
    for m in &batch {
        assert!((m.duration() - 0.1).abs() < 1e-9);
    }
}

#[tokio::test(start_paused = true)]
async fn test_worker_posts_to_its_own_path() {
    let client = Arc::new(MockClient::new());
    let (worker, batch_rx) = create_test_worker(4, client.clone(), 3);

    worker.run().await.expect("Worker failed");
    batch_rx.recv().await.expect("No batch received");

    let paths = client.paths.lock().unwrap();
    assert_eq!(paths.len(), 3);
    assert!(paths.iter().all(|p| *p == worker_path(4)));
}

#[tokio::test(start_paused = true)]
async fn test_worker_iterations_are_sequential() {
    let client = Arc::new(MockClient::new().with_delay(Duration::from_millis(250)));
    let (worker, batch_rx) = create_test_worker(1, client, 4);

    let start = tokio::time::Instant::now();
    worker.run().await.expect("Worker failed");
    let elapsed = start.elapsed();

    // Four calls back to back, never overlapping
    assert!(elapsed >= Duration::from_millis(1000));

    let batch = batch_rx.recv().await.unwrap();
    assert_eq!(batch.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_worker_stops_at_first_failure() {
    let client = Arc::new(MockClient::new().with_fail_on_call(3));
    let (worker, batch_rx) = create_test_worker(2, client.clone(), 5);

    let err = worker.run().await.unwrap_err();
    let batch = batch_rx.recv().await.expect("Partial batch not sent");

    assert!(matches!(err, LoadError::Request(ref f) if f.status() == Some(500)));
    // The two calls before the failure are kept, nothing after it is issued
    assert_eq!(batch.len(), 2);
    assert_eq!(client.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_worker_failure_on_first_call_sends_empty_batch() {
    let client = Arc::new(MockClient::new().with_fail_on_call(1));
    let (worker, batch_rx) = create_test_worker(1, client, 5);

    assert!(worker.run().await.is_err());
    assert!(batch_rx.recv().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_worker_with_huge_iteration_count_fails_cleanly() {
    // 16 bytes per measurement: reserving this many up front would abort
    let client = Arc::new(MockClient::new().with_fail_on_call(1));
    let (worker, batch_rx) = create_test_worker(1, client.clone(), 100_000_000_000);

    let err = worker.run().await.unwrap_err();
    assert!(matches!(err, LoadError::Request(_)));
    assert!(batch_rx.recv().await.unwrap().is_empty());
    assert_eq!(client.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_worker_measurements_are_ordered_in_time() {
    let client = Arc::new(MockClient::new().with_delay(Duration::from_millis(10)));
    let (worker, batch_rx) = create_test_worker(1, client, 10);

    worker.run().await.unwrap();
    let batch = batch_rx.recv().await.unwrap();

    assert!(batch
        .windows(2)
        .all(|pair| pair[0].start_time() <= pair[1].start_time()));
    assert!(batch.iter().all(|m| m.duration() >= 0.0));
}

#[tokio::test]
async fn test_worker_reports_when_receiver_gone() {
    let client = Arc::new(MockClient::new());
    let (worker, batch_rx) = create_test_worker(1, client, 2);
    drop(batch_rx);

    let err = worker.run().await.unwrap_err();
    assert!(err.is_transfer());
}

#[test]
fn test_worker_debug_format() {
    let client = Arc::new(MockClient::new());
    let (worker, _rx) = create_test_worker(5, client, 1);

    let debug = format!("{:?}", worker);
    assert!(debug.contains("Worker"));
    assert!(debug.contains("mock"));
    assert!(debug.contains("load_5"));
}
