//! Integration tests for batch coalescing and per-query result routing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use prism::api::{ApiError, ApiResult, BatchEntry, BatchResponse};
use prism::batch::{BatchCoordinator, BatchError, BatchExecutor};
use prism::model::CompiledQuery;

/// Scripted executor: answers every query positionally from a template and
/// records how it was called.
struct ScriptedExecutor {
    calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
    fail_transport: bool,
    /// Entries returned per batch; shorter scripts truncate the response.
    truncate_to: Option<usize>,
    failing_positions: Vec<usize>,
}

impl ScriptedExecutor {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
            fail_transport: false,
            truncate_to: None,
            failing_positions: Vec::new(),
        }
    }
}

#[async_trait]
impl BatchExecutor for ScriptedExecutor {
    async fn execute_batch(&self, queries: Vec<CompiledQuery>) -> ApiResult<BatchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(queries.len());

        if self.fail_transport {
            return Err(ApiError::Status {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }

        let mut results: Vec<BatchEntry> = queries
            .iter()
            .enumerate()
            .map(|(i, query)| {
                if self.failing_positions.contains(&i) {
                    BatchEntry {
                        success: false,
                        data: None,
                        annotation: None,
                        error: Some(format!("query {i} rejected")),
                    }
                } else {
                    BatchEntry {
                        success: true,
                        data: Some(json!({"measures": query.measures})),
                        annotation: None,
                        error: None,
                    }
                }
            })
            .collect();
        if let Some(limit) = self.truncate_to {
            results.truncate(limit);
        }
        Ok(BatchResponse { results })
    }
}

fn query(measure: &str) -> CompiledQuery {
    CompiledQuery {
        measures: Some(vec![measure.to_string()]),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_same_window_registrations_share_one_round_trip() {
    let executor = Arc::new(ScriptedExecutor::new());
    let coordinator = BatchCoordinator::new(executor.clone(), Duration::from_millis(10));

    let (a, b, c) = tokio::join!(
        coordinator.register(query("Orders.count")),
        coordinator.register(query("Orders.revenue")),
        coordinator.register(query("Signups.count")),
    );

    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    assert_eq!(*executor.batch_sizes.lock().unwrap(), vec![3]);
    assert_eq!(a.unwrap().data["measures"][0], "Orders.count");
    assert_eq!(b.unwrap().data["measures"][0], "Orders.revenue");
    assert_eq!(c.unwrap().data["measures"][0], "Signups.count");
}

#[tokio::test]
async fn test_registrations_after_flush_start_a_new_batch() {
    let executor = Arc::new(ScriptedExecutor::new());
    let coordinator = BatchCoordinator::new(executor.clone(), Duration::from_millis(5));

    coordinator.register(query("Orders.count")).await.unwrap();
    coordinator.register(query("Orders.revenue")).await.unwrap();

    assert_eq!(executor.calls.load(Ordering::SeqCst), 2);
    assert_eq!(*executor.batch_sizes.lock().unwrap(), vec![1, 1]);
}

#[tokio::test]
async fn test_one_failing_query_does_not_poison_its_siblings() {
    let mut executor = ScriptedExecutor::new();
    executor.failing_positions = vec![1];
    let coordinator = BatchCoordinator::new(Arc::new(executor), Duration::from_millis(5));

    let (a, b) = tokio::join!(
        coordinator.register(query("Orders.count")),
        coordinator.register(query("Orders.broken")),
    );

    assert!(a.is_ok());
    assert_eq!(b, Err(BatchError::Query("query 1 rejected".to_string())));
}

#[tokio::test]
async fn test_transport_failure_rejects_every_registration() {
    let mut executor = ScriptedExecutor::new();
    executor.fail_transport = true;
    let coordinator = BatchCoordinator::new(Arc::new(executor), Duration::from_millis(5));

    let (a, b) = tokio::join!(
        coordinator.register(query("Orders.count")),
        coordinator.register(query("Orders.revenue")),
    );

    assert!(matches!(a, Err(BatchError::Transport(_))));
    assert!(matches!(b, Err(BatchError::Transport(_))));
}

#[tokio::test]
async fn test_short_response_yields_synthetic_missing_results() {
    let mut executor = ScriptedExecutor::new();
    executor.truncate_to = Some(1);
    let coordinator = BatchCoordinator::new(Arc::new(executor), Duration::from_millis(5));

    let (a, b, c) = tokio::join!(
        coordinator.register(query("Orders.count")),
        coordinator.register(query("Orders.revenue")),
        coordinator.register(query("Signups.count")),
    );

    assert!(a.is_ok());
    assert_eq!(b, Err(BatchError::MissingResult(1)));
    assert_eq!(c, Err(BatchError::MissingResult(2)));
}

#[tokio::test]
async fn test_clear_rejects_pending_registrations_as_dropped() {
    let executor = Arc::new(ScriptedExecutor::new());
    let coordinator = BatchCoordinator::new(executor.clone(), Duration::from_secs(60));

    let pending = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.register(query("Orders.count")).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(coordinator.queue_len().await, 1);

    coordinator.clear().await;
    assert_eq!(pending.await.unwrap(), Err(BatchError::Dropped));
    assert_eq!(coordinator.queue_len().await, 0);
    assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
}
