//! Query state store: a closed set of named actions applied to an owned,
//! immutable snapshot.
//!
//! Every action takes the prior store by reference and returns the next
//! store; nothing downstream of the store (builder, mode compilers, merge
//! coordinator) ever mutates query state. Invariant violations such as an
//! out-of-range index fail loudly in development builds (`debug_assert!`)
//! and degrade to a logged no-op in release.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::model::{Filter, Granularity, MergeStrategy, QueryState, SortDirection};

/// An edit scoped to one query state.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryAction {
    AddMetric { field: String },
    RemoveMetric { id: Uuid },
    RelabelMetric { id: Uuid, label: String },
    AddBreakdown { field: String },
    AddTimeBreakdown { field: String, granularity: Granularity },
    RemoveBreakdown { id: Uuid },
    SetGranularity { id: Uuid, granularity: Granularity },
    SetComparison { id: Uuid, enabled: bool },
    AddFilter { filter: Filter },
    RemoveFilter { index: usize },
    SetFilters { filters: Vec<Filter> },
    SetOrder { field: String, direction: SortDirection },
    ClearOrder { field: String },
}

/// An action on the store as a whole.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    AddQuery,
    RemoveQuery { index: usize },
    SetActive { index: usize },
    SetMergeStrategy { strategy: MergeStrategy },
    Edit { index: usize, action: QueryAction },
}

/// One or more query states plus the merge strategy and active tab.
///
/// Invariant: `states` is never empty and `active < states.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStore {
    pub states: Vec<QueryState>,
    pub active: usize,
    pub merge_strategy: MergeStrategy,
}

impl Default for QueryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryStore {
    pub fn new() -> Self {
        Self {
            states: vec![QueryState::new()],
            active: 0,
            merge_strategy: MergeStrategy::Concat,
        }
    }

    /// The state of the active query tab.
    pub fn active_state(&self) -> &QueryState {
        // The reducer maintains active < states.len().
        &self.states[self.active]
    }

    /// Apply an action, returning the next store. The prior store is left
    /// untouched.
    #[must_use]
    pub fn apply(&self, action: StoreAction) -> QueryStore {
        let mut next = self.clone();
        match action {
            StoreAction::AddQuery => {
                next.states.push(QueryState::new());
                next.active = next.states.len() - 1;
            }
            StoreAction::RemoveQuery { index } => {
                if index >= next.states.len() {
                    debug_assert!(false, "remove query: index {index} out of range");
                    warn!(index, len = next.states.len(), "remove query out of range");
                    return next;
                }
                if next.states.len() == 1 {
                    warn!("refusing to remove the last query state");
                    return next;
                }
                next.states.remove(index);
                if next.active >= next.states.len() {
                    next.active = next.states.len() - 1;
                }
            }
            StoreAction::SetActive { index } => {
                if index >= next.states.len() {
                    debug_assert!(false, "set active: index {index} out of range");
                    warn!(index, len = next.states.len(), "set active out of range");
                    return next;
                }
                next.active = index;
            }
            StoreAction::SetMergeStrategy { strategy } => {
                next.merge_strategy = strategy;
            }
            StoreAction::Edit { index, action } => {
                let Some(state) = next.states.get_mut(index) else {
                    debug_assert!(false, "edit: index {index} out of range");
                    warn!(index, len = next.states.len(), "edit out of range");
                    return next;
                };
                apply_query_action(state, action);
            }
        }
        next
    }

    /// Apply an edit to the active query state.
    #[must_use]
    pub fn apply_active(&self, action: QueryAction) -> QueryStore {
        self.apply(StoreAction::Edit {
            index: self.active,
            action,
        })
    }
}

fn apply_query_action(state: &mut QueryState, action: QueryAction) {
    match action {
        QueryAction::AddMetric { field } => {
            state.add_metric(field);
        }
        QueryAction::RemoveMetric { id } => {
            state.metrics.retain(|m| m.id != id);
        }
        QueryAction::RelabelMetric { id, label } => {
            if let Some(m) = state.metrics.iter_mut().find(|m| m.id == id) {
                m.label = label;
            }
        }
        QueryAction::AddBreakdown { field } => {
            state.add_breakdown(field);
        }
        QueryAction::AddTimeBreakdown { field, granularity } => {
            state.add_time_breakdown(field, granularity);
        }
        QueryAction::RemoveBreakdown { id } => {
            state.breakdowns.retain(|b| b.id != id);
        }
        QueryAction::SetGranularity { id, granularity } => {
            if let Some(b) = state
                .breakdowns
                .iter_mut()
                .find(|b| b.id == id && b.is_time_dimension)
            {
                b.granularity = Some(granularity);
            }
        }
        QueryAction::SetComparison { id, enabled } => {
            if let Some(b) = state
                .breakdowns
                .iter_mut()
                .find(|b| b.id == id && b.is_time_dimension)
            {
                b.enable_comparison = enabled;
            }
        }
        QueryAction::AddFilter { filter } => {
            state.filters.push(filter);
        }
        QueryAction::RemoveFilter { index } => {
            if index < state.filters.len() {
                state.filters.remove(index);
            } else {
                warn!(index, len = state.filters.len(), "remove filter out of range");
            }
        }
        QueryAction::SetFilters { filters } => {
            state.filters = filters;
        }
        QueryAction::SetOrder { field, direction } => {
            if let Some(entry) = state.order.iter_mut().find(|(f, _)| *f == field) {
                entry.1 = direction;
            } else {
                state.order.push((field, direction));
            }
        }
        QueryAction::ClearOrder { field } => {
            state.order.retain(|(f, _)| *f != field);
        }
    }
}
