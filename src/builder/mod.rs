//! Query builder: the pure transform from a `QueryState` to the flat
//! server query object.
//!
//! ```text
//! QueryState ──build()──> CompiledQuery ──(merge coordinator)──> [CompiledQuery]
//! ```
//!
//! `build` is total over any valid state and has no error conditions. The
//! omission rule is load-bearing: an optional key is absent from the result
//! whenever its source is empty, never an empty array.

mod merge;

pub use merge::{
    build_all_queries, build_multi_query_config, is_multi_query_mode, merge_keys, MultiQueryConfig,
};

use crate::model::{non_empty, CompiledQuery, Filter, QueryState, TimeDimensionSpec};

/// Build the flat server query for one state.
pub fn build(state: &QueryState) -> CompiledQuery {
    let measures: Vec<String> = state.metrics.iter().map(|m| m.field.clone()).collect();

    let dimensions: Vec<String> = state
        .breakdowns
        .iter()
        .filter(|b| !b.is_time_dimension)
        .map(|b| b.field.clone())
        .collect();

    let time_dimensions: Vec<TimeDimensionSpec> = state
        .breakdowns
        .iter()
        .filter(|b| b.is_time_dimension)
        .map(|b| TimeDimensionSpec {
            dimension: b.field.clone(),
            granularity: b.granularity,
            date_range: None,
            comparison: b.enable_comparison.then_some(true),
        })
        .collect();

    let filters: Vec<_> = state.filters.iter().map(Filter::to_server).collect();

    CompiledQuery {
        measures: non_empty(measures),
        dimensions: non_empty(dimensions),
        time_dimensions: non_empty(time_dimensions),
        filters: non_empty(filters),
        order: non_empty(state.order.clone()),
    }
}
