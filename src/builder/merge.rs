//! Multi-query merge coordinator.
//!
//! Decides whether the store is in multi-query mode, applies merge-mode
//! breakdown sharing, and assembles the final set of queries to execute.
//! Under [`MergeStrategy::Merge`], every query after the first is built
//! with the first query's breakdowns substituted for its own; the state's
//! own breakdowns stay stored (the UI keeps showing them) but are not used
//! for query building.

use crate::model::{CompiledQuery, MergeStrategy, QueryState};

/// The assembled multi-query payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiQueryConfig {
    pub queries: Vec<CompiledQuery>,
    pub merge_strategy: MergeStrategy,
    /// First query's breakdown fields; defined only under `Merge`.
    pub merge_keys: Option<Vec<String>>,
    /// One display label per query, aligned with `queries`.
    pub query_labels: Vec<String>,
}

/// True iff at least two states exist and at least two of them individually
/// have content. A single populated state among empties is still
/// single-query mode.
pub fn is_multi_query_mode(states: &[QueryState]) -> bool {
    states.len() >= 2 && states.iter().filter(|s| !s.is_empty()).count() >= 2
}

/// Build every state's query, applying merge-mode breakdown sharing.
pub fn build_all_queries(states: &[QueryState], strategy: MergeStrategy) -> Vec<CompiledQuery> {
    states
        .iter()
        .enumerate()
        .map(|(i, state)| {
            if i > 0 && strategy == MergeStrategy::Merge {
                let mut shared = state.clone();
                shared.breakdowns = states[0].breakdowns.clone();
                super::build(&shared)
            } else {
                super::build(state)
            }
        })
        .collect()
}

/// The first state's breakdown fields, or `None` when the strategy is not
/// `Merge` or the first state has no breakdowns.
pub fn merge_keys(states: &[QueryState], strategy: MergeStrategy) -> Option<Vec<String>> {
    if strategy != MergeStrategy::Merge {
        return None;
    }
    let first = states.first()?;
    if first.breakdowns.is_empty() {
        return None;
    }
    Some(first.breakdowns.iter().map(|b| b.field.clone()).collect())
}

/// Assemble the multi-query payload, or `None` when fewer than two queries
/// carry content; the caller falls back to single-query execution.
pub fn build_multi_query_config(
    states: &[QueryState],
    strategy: MergeStrategy,
) -> Option<MultiQueryConfig> {
    let all = build_all_queries(states, strategy);

    let surviving: Vec<(usize, CompiledQuery)> = all
        .into_iter()
        .enumerate()
        .filter(|(_, q)| q.has_content())
        .collect();

    if surviving.len() < 2 {
        return None;
    }

    let query_labels = surviving
        .iter()
        .map(|(i, _)| format!("Query {}", i + 1))
        .collect();
    let queries = surviving.into_iter().map(|(_, q)| q).collect();

    Some(MultiQueryConfig {
        queries,
        merge_strategy: strategy,
        merge_keys: merge_keys(states, strategy),
        query_labels,
    })
}
