//! Integration tests for execution coordination: planning, token
//! supersession and batch integration.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use prism::api::{ApiResult, BatchEntry, BatchResponse, QueryResult};
use prism::batch::{BatchCoordinator, BatchExecutor};
use prism::config::ExecutionSettings;
use prism::exec::{
    AnalysisMode, AnalysisSnapshot, ExecutionCoordinator, ExecutionOutcome, ExecutionState,
    QueryExecutor, SkipReason,
};
use prism::model::{CompiledQuery, ModeQuery, SimpleFilter};
use prism::modes::{FunnelState, FunnelStep};
use prism::store::{QueryAction, QueryStore, StoreAction};

struct CountingExecutor {
    loads: AtomicUsize,
    mode_loads: AtomicUsize,
    delay: Duration,
}

impl CountingExecutor {
    fn new() -> Self {
        Self {
            loads: AtomicUsize::new(0),
            mode_loads: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl QueryExecutor for CountingExecutor {
    async fn execute(&self, query: &CompiledQuery) -> ApiResult<QueryResult> {
        tokio::time::sleep(self.delay).await;
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(QueryResult {
            data: json!({"measures": query.measures}),
            annotation: None,
            cache: None,
        })
    }

    async fn execute_mode(&self, _query: &ModeQuery) -> ApiResult<QueryResult> {
        self.mode_loads.fetch_add(1, Ordering::SeqCst);
        Ok(QueryResult {
            data: json!([]),
            annotation: None,
            cache: None,
        })
    }
}

struct EchoBatch {
    calls: AtomicUsize,
}

#[async_trait]
impl BatchExecutor for EchoBatch {
    async fn execute_batch(&self, queries: Vec<CompiledQuery>) -> ApiResult<BatchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(BatchResponse {
            results: queries
                .iter()
                .map(|q| BatchEntry {
                    success: true,
                    data: Some(json!({"measures": q.measures})),
                    annotation: None,
                    error: None,
                })
                .collect(),
        })
    }
}

fn coordinator_with(
    executor: Arc<CountingExecutor>,
    batch: Arc<EchoBatch>,
) -> ExecutionCoordinator {
    ExecutionCoordinator::new(
        executor,
        BatchCoordinator::new(batch, Duration::from_millis(5)),
        Duration::from_millis(10),
    )
}

fn single_query_snapshot() -> AnalysisSnapshot {
    let store = QueryStore::new().apply_active(QueryAction::AddMetric {
        field: "Orders.count".to_string(),
    });
    AnalysisSnapshot {
        store,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_empty_snapshot_skips_without_calling_the_executor() {
    let executor = Arc::new(CountingExecutor::new());
    let batch = Arc::new(EchoBatch {
        calls: AtomicUsize::new(0),
    });
    let coordinator = coordinator_with(executor.clone(), batch);

    let outcome = coordinator.execute(&AnalysisSnapshot::default()).await;

    assert_eq!(outcome, ExecutionOutcome::Skipped(SkipReason::EmptyQuery));
    assert_eq!(executor.loads.load(Ordering::SeqCst), 0);
    assert_eq!(coordinator.state(), ExecutionState::Idle);
}

#[tokio::test]
async fn test_unready_funnel_skips_with_its_validation_report() {
    let executor = Arc::new(CountingExecutor::new());
    let batch = Arc::new(EchoBatch {
        calls: AtomicUsize::new(0),
    });
    let coordinator = coordinator_with(executor.clone(), batch);

    let snapshot = AnalysisSnapshot {
        mode: AnalysisMode::Funnel,
        ..Default::default()
    };
    let outcome = coordinator.execute(&snapshot).await;

    match outcome {
        ExecutionOutcome::Skipped(SkipReason::ModeNotReady(report)) => {
            assert!(!report.is_valid);
        }
        other => panic!("expected mode-not-ready skip, got {other:?}"),
    }
    assert_eq!(executor.mode_loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_single_query_loads_through_the_flat_path() {
    let executor = Arc::new(CountingExecutor::new());
    let batch = Arc::new(EchoBatch {
        calls: AtomicUsize::new(0),
    });
    let coordinator = coordinator_with(executor.clone(), batch.clone());

    let outcome = coordinator.execute(&single_query_snapshot()).await;

    match &outcome {
        ExecutionOutcome::Loaded { results, labels } => {
            assert_eq!(results.len(), 1);
            assert_eq!(labels, &vec!["Query 1".to_string()]);
            let result = results[0].as_ref().unwrap();
            assert_eq!(result.data["measures"][0], "Orders.count");
        }
        other => panic!("expected loaded outcome, got {other:?}"),
    }
    assert_eq!(executor.loads.load(Ordering::SeqCst), 1);
    assert_eq!(batch.calls.load(Ordering::SeqCst), 0);
    assert!(matches!(coordinator.state(), ExecutionState::Loaded { .. }));
}

#[tokio::test]
async fn test_multi_query_snapshot_runs_as_one_batch() {
    let executor = Arc::new(CountingExecutor::new());
    let batch = Arc::new(EchoBatch {
        calls: AtomicUsize::new(0),
    });
    let coordinator = coordinator_with(executor.clone(), batch.clone());

    let mut store = QueryStore::new().apply_active(QueryAction::AddMetric {
        field: "Orders.count".to_string(),
    });
    store = store.apply(StoreAction::AddQuery);
    store = store.apply_active(QueryAction::AddMetric {
        field: "Signups.count".to_string(),
    });
    let snapshot = AnalysisSnapshot {
        store,
        ..Default::default()
    };

    let outcome = coordinator.execute(&snapshot).await;

    match outcome {
        ExecutionOutcome::Loaded { results, labels } => {
            assert_eq!(results.len(), 2);
            assert_eq!(labels, vec!["Query 1", "Query 2"]);
            assert!(results.iter().all(Result::is_ok));
        }
        other => panic!("expected loaded outcome, got {other:?}"),
    }
    assert_eq!(batch.calls.load(Ordering::SeqCst), 1);
    assert_eq!(executor.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ready_funnel_executes_as_a_mode_query() {
    let executor = Arc::new(CountingExecutor::new());
    let batch = Arc::new(EchoBatch {
        calls: AtomicUsize::new(0),
    });
    let coordinator = coordinator_with(executor.clone(), batch);

    let snapshot = AnalysisSnapshot {
        mode: AnalysisMode::Funnel,
        funnel: FunnelState {
            binding_key: Some("Events.userId".to_string()),
            time_dimension: Some("Events.timestamp".to_string()),
            steps: vec![FunnelStep {
                name: "Signup".to_string(),
                filters: vec![SimpleFilter::equals("Events.name", "signup").into()],
            }],
            ..Default::default()
        },
        ..Default::default()
    };

    let outcome = coordinator.execute(&snapshot).await;
    match outcome {
        ExecutionOutcome::Loaded { labels, .. } => {
            assert_eq!(labels, vec!["Funnel"]);
        }
        other => panic!("expected loaded outcome, got {other:?}"),
    }
    assert_eq!(executor.mode_loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_newer_request_supersedes_a_slower_older_one() {
    let mut slow = CountingExecutor::new();
    slow.delay = Duration::from_millis(50);
    let executor = Arc::new(slow);
    let batch = Arc::new(EchoBatch {
        calls: AtomicUsize::new(0),
    });
    let coordinator = coordinator_with(executor.clone(), batch);

    let first = {
        let coordinator = coordinator.clone();
        let snapshot = single_query_snapshot();
        tokio::spawn(async move { coordinator.execute(&snapshot).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = coordinator.execute(&single_query_snapshot()).await;

    assert_eq!(first.await.unwrap(), ExecutionOutcome::Superseded);
    assert!(matches!(second, ExecutionOutcome::Loaded { .. }));
    // Both requests ran; only the newer one's results were committed.
    assert_eq!(executor.loads.load(Ordering::SeqCst), 2);
    assert!(matches!(coordinator.state(), ExecutionState::Loaded { .. }));
}

#[tokio::test]
async fn test_settings_construct_a_working_coordinator() {
    let executor = Arc::new(CountingExecutor::new());
    let batch = Arc::new(EchoBatch {
        calls: AtomicUsize::new(0),
    });
    let settings = ExecutionSettings {
        debounce_ms: 5,
        batch_window_ms: 5,
    };
    let coordinator = ExecutionCoordinator::from_settings(executor.clone(), batch, &settings);

    let outcome = coordinator.execute(&single_query_snapshot()).await;
    assert!(matches!(outcome, ExecutionOutcome::Loaded { .. }));
    assert_eq!(executor.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_schedule_debounces_bursts_to_one_execution() {
    let executor = Arc::new(CountingExecutor::new());
    let batch = Arc::new(EchoBatch {
        calls: AtomicUsize::new(0),
    });
    let coordinator = coordinator_with(executor.clone(), batch);

    for _ in 0..4 {
        coordinator.schedule(single_query_snapshot());
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(executor.loads.load(Ordering::SeqCst), 1);
    assert!(matches!(coordinator.state(), ExecutionState::Loaded { .. }));
}
