//! Execution coordination: deciding what to run for the current analysis
//! snapshot and applying only the results that are still wanted.
//!
//! Every execution takes a monotonically increasing request token. A
//! completed execution whose token is no longer current is discarded in
//! full, so a slow early response can never overwrite the results of a
//! later request. Incomplete mode configurations and empty queries skip
//! execution entirely; skipping is a normal outcome, not an error.

mod debounce;
mod plan;

pub use debounce::Debouncer;
pub use plan::{plan, ExecutionPlan, SkipReason};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::api::{ApiResult, QueryApiClient, QueryResult};
use crate::batch::{BatchCoordinator, BatchError, BatchExecutor, BatchResult};
use crate::config::ExecutionSettings;
use crate::model::{ChartConfig, CompiledQuery, ModeQuery};
use crate::modes::{FlowState, FunnelState, RetentionState};
use crate::store::QueryStore;

/// Which analysis surface is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    #[default]
    Query,
    Funnel,
    Flow,
    Retention,
}

/// Everything the coordinator needs to decide and run one execution.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSnapshot {
    pub store: QueryStore,
    pub chart: Option<ChartConfig>,
    pub mode: AnalysisMode,
    pub funnel: FunnelState,
    pub flow: FlowState,
    pub retention: RetentionState,
}

/// Executes one query or one mode query.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &CompiledQuery) -> ApiResult<QueryResult>;
    async fn execute_mode(&self, query: &ModeQuery) -> ApiResult<QueryResult>;
}

#[async_trait]
impl QueryExecutor for QueryApiClient {
    async fn execute(&self, query: &CompiledQuery) -> ApiResult<QueryResult> {
        self.load(query).await
    }

    async fn execute_mode(&self, query: &ModeQuery) -> ApiResult<QueryResult> {
        self.load_mode(query).await
    }
}

/// Outcome of one execution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Nothing was run; the snapshot had nothing runnable.
    Skipped(SkipReason),
    /// Per-query results, aligned with `labels`. Individual entries may
    /// still be errors under multi-query execution.
    Loaded {
        results: Vec<BatchResult>,
        labels: Vec<String>,
    },
    /// The request as a whole failed.
    Failed(String),
    /// A newer request superseded this one; its results were discarded.
    Superseded,
}

/// Externally observable execution state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExecutionState {
    #[default]
    Idle,
    Loading,
    Loaded {
        results: Vec<BatchResult>,
        labels: Vec<String>,
    },
    Failed(String),
}

/// Runs executions for analysis snapshots, debounced and token-guarded.
#[derive(Clone)]
pub struct ExecutionCoordinator {
    executor: Arc<dyn QueryExecutor>,
    batch: BatchCoordinator,
    debouncer: Arc<Debouncer>,
    seq: Arc<AtomicU64>,
    state: Arc<Mutex<ExecutionState>>,
}

impl ExecutionCoordinator {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        batch: BatchCoordinator,
        debounce: Duration,
    ) -> Self {
        Self {
            executor,
            batch,
            debouncer: Arc::new(Debouncer::new(debounce)),
            seq: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(ExecutionState::Idle)),
        }
    }

    /// Build a coordinator from [`ExecutionSettings`]: the configured batch
    /// coalescing window and edit debounce delay.
    pub fn from_settings(
        executor: Arc<dyn QueryExecutor>,
        batch_executor: Arc<dyn BatchExecutor>,
        settings: &ExecutionSettings,
    ) -> Self {
        Self::new(
            executor,
            BatchCoordinator::new(batch_executor, settings.batch_window()),
            settings.debounce(),
        )
    }

    pub fn state(&self) -> ExecutionState {
        self.state.lock().expect("state lock poisoned").clone()
    }

    /// Schedule a debounced execution of `snapshot`. Earlier scheduled
    /// snapshots that have not started yet are dropped.
    pub fn schedule(&self, snapshot: AnalysisSnapshot) {
        let this = self.clone();
        self.debouncer.call(async move {
            this.execute(&snapshot).await;
        });
    }

    /// Execute `snapshot` now. Returns the outcome; state is updated only
    /// when the request is still current on completion.
    pub async fn execute(&self, snapshot: &AnalysisSnapshot) -> ExecutionOutcome {
        let token = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        let plan = plan::plan(snapshot);
        if let ExecutionPlan::Skip(reason) = &plan {
            debug!(?reason, "execution skipped");
            return self.apply(token, ExecutionOutcome::Skipped(reason.clone()));
        }

        self.set_state_if_current(token, ExecutionState::Loading);
        let outcome = self.run(plan).await;
        self.apply(token, outcome)
    }

    async fn run(&self, plan: ExecutionPlan) -> ExecutionOutcome {
        match plan {
            ExecutionPlan::Skip(reason) => ExecutionOutcome::Skipped(reason),
            ExecutionPlan::Single(query) => match self.executor.execute(&query).await {
                Ok(result) => ExecutionOutcome::Loaded {
                    results: vec![Ok(result)],
                    labels: vec!["Query 1".to_string()],
                },
                Err(error) => ExecutionOutcome::Failed(error.to_string()),
            },
            ExecutionPlan::Multi(config) => {
                let registrations = config
                    .queries
                    .into_iter()
                    .map(|query| self.batch.register(query));
                let results = join_all(registrations).await;
                if results.iter().all(|r| r.is_err()) {
                    // Wholesale failure is surfaced as one request failure
                    // rather than a row of identical per-query errors.
                    if let Some(Err(BatchError::Transport(message))) = results.first() {
                        return ExecutionOutcome::Failed(message.clone());
                    }
                }
                ExecutionOutcome::Loaded {
                    results,
                    labels: config.query_labels,
                }
            }
            ExecutionPlan::Mode(query) => match self.executor.execute_mode(&query).await {
                Ok(result) => ExecutionOutcome::Loaded {
                    results: vec![Ok(result)],
                    labels: vec![mode_label(&query).to_string()],
                },
                Err(error) => ExecutionOutcome::Failed(error.to_string()),
            },
        }
    }

    /// Commit `outcome` if `token` is still the latest request, otherwise
    /// discard it.
    fn apply(&self, token: u64, outcome: ExecutionOutcome) -> ExecutionOutcome {
        if self.seq.load(Ordering::SeqCst) != token {
            debug!(token, "discarding superseded execution result");
            return ExecutionOutcome::Superseded;
        }

        let next = match &outcome {
            ExecutionOutcome::Skipped(_) => ExecutionState::Idle,
            ExecutionOutcome::Loaded { results, labels } => ExecutionState::Loaded {
                results: results.clone(),
                labels: labels.clone(),
            },
            ExecutionOutcome::Failed(message) => {
                warn!(error = %message, "execution failed");
                ExecutionState::Failed(message.clone())
            }
            ExecutionOutcome::Superseded => return outcome,
        };
        self.set_state_if_current(token, next);
        outcome
    }

    fn set_state_if_current(&self, token: u64, next: ExecutionState) {
        if self.seq.load(Ordering::SeqCst) == token {
            *self.state.lock().expect("state lock poisoned") = next;
        }
    }
}

fn mode_label(query: &ModeQuery) -> &'static str {
    match query {
        ModeQuery::Funnel(_) => "Funnel",
        ModeQuery::Flow(_) => "Flow",
        ModeQuery::Retention(_) => "Retention",
    }
}
