//! Request-coalescing batch coordinator.
//!
//! Independent `register` calls arriving within one coalescing window are
//! grouped into a single network round trip, while each caller still
//! receives an individually resolving outcome. The internal queue is owned
//! exclusively by the coordinator: it is snapshotted and cleared
//! synchronously before the executor is awaited, so registrations arriving
//! during the round trip start a fresh batch rather than racing with the
//! in-flight one.
//!
//! Results are paired to requests strictly by position, never by content;
//! the wire protocol preserves request order in the response array.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use crate::api::{ApiError, ApiResult, BatchResponse, QueryResult};
use crate::model::CompiledQuery;

/// Result type for one registered query.
pub type BatchResult = Result<QueryResult, BatchError>;

/// Errors surfaced to individual batch registrations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// The batch call itself failed; every query in the batch gets this.
    #[error("batch transport failed: {0}")]
    Transport(String),

    /// The server rejected this query; siblings are unaffected.
    #[error("query failed: {0}")]
    Query(String),

    /// The response array was shorter than the request array. Missing
    /// positions become synthetic failures instead of indexing out of
    /// bounds.
    #[error("batch response missing result at position {0}")]
    MissingResult(usize),

    /// The pending queue was cleared before the batch was executed.
    #[error("batch was cleared before execution")]
    Dropped,
}

/// Executes one batch of queries in a single call.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn execute_batch(&self, queries: Vec<CompiledQuery>) -> ApiResult<BatchResponse>;
}

#[async_trait]
impl BatchExecutor for crate::api::QueryApiClient {
    async fn execute_batch(&self, queries: Vec<CompiledQuery>) -> ApiResult<BatchResponse> {
        self.batch(&queries).await
    }
}

/// A registration waiting for its batch to flush.
struct QueuedQuery {
    query: CompiledQuery,
    tx: oneshot::Sender<BatchResult>,
}

#[derive(Default)]
struct Queue {
    entries: Vec<QueuedQuery>,
    flush_scheduled: bool,
}

/// Coalesces same-window registrations into one executor call.
#[derive(Clone)]
pub struct BatchCoordinator {
    executor: Arc<dyn BatchExecutor>,
    window: Duration,
    queue: Arc<Mutex<Queue>>,
}

impl BatchCoordinator {
    /// Create a coordinator flushing `window` after the first registration
    /// of a batch. A zero window still coalesces same-tick registrations.
    pub fn new(executor: Arc<dyn BatchExecutor>, window: Duration) -> Self {
        Self {
            executor,
            window,
            queue: Arc::new(Mutex::new(Queue::default())),
        }
    }

    /// Register a query for the current batch and await its own outcome.
    pub async fn register(&self, query: CompiledQuery) -> BatchResult {
        let (tx, rx) = oneshot::channel();
        {
            let mut queue = self.queue.lock().await;
            queue.entries.push(QueuedQuery { query, tx });
            if !queue.flush_scheduled {
                queue.flush_scheduled = true;
                let this = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(this.window).await;
                    this.flush().await;
                });
            }
        }

        match rx.await {
            Ok(result) => result,
            // Sender dropped without a result; treat like a cleared queue.
            Err(_) => Err(BatchError::Dropped),
        }
    }

    /// Number of registrations waiting for the next flush.
    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.entries.len()
    }

    /// Drop all pending registrations, rejecting each with
    /// [`BatchError::Dropped`]. Test and teardown use.
    pub async fn clear(&self) {
        let entries = {
            let mut queue = self.queue.lock().await;
            std::mem::take(&mut queue.entries)
        };
        for entry in entries {
            let _ = entry.tx.send(Err(BatchError::Dropped));
        }
    }

    async fn flush(&self) {
        // Snapshot and clear before any await so late registrations start a
        // fresh batch.
        let entries = {
            let mut queue = self.queue.lock().await;
            queue.flush_scheduled = false;
            std::mem::take(&mut queue.entries)
        };
        if entries.is_empty() {
            return;
        }

        let queries: Vec<CompiledQuery> = entries.iter().map(|e| e.query.clone()).collect();
        debug!(count = queries.len(), "flushing query batch");

        match self.executor.execute_batch(queries).await {
            Ok(response) => {
                let mut results = response.results.into_iter();
                for (position, entry) in entries.into_iter().enumerate() {
                    let outcome = match results.next() {
                        Some(r) if r.success => Ok(QueryResult {
                            data: r.data.unwrap_or(serde_json::Value::Null),
                            annotation: r.annotation,
                            cache: None,
                        }),
                        Some(r) => Err(BatchError::Query(
                            r.error.unwrap_or_else(|| "unknown error".to_string()),
                        )),
                        None => {
                            warn!(position, "batch response shorter than request");
                            Err(BatchError::MissingResult(position))
                        }
                    };
                    let _ = entry.tx.send(outcome);
                }
            }
            Err(error) => {
                warn!(error = %error, "batch transport failed");
                let message = transport_message(&error);
                for entry in entries {
                    let _ = entry.tx.send(Err(BatchError::Transport(message.clone())));
                }
            }
        }
    }
}

fn transport_message(error: &ApiError) -> String {
    error.to_string()
}
