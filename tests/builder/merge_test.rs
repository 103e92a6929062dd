//! Integration tests for multi-query assembly and merge-mode sharing.

use prism::builder::{build_all_queries, build_multi_query_config, is_multi_query_mode};
use prism::model::{Granularity, MergeStrategy, QueryState};

fn orders_state() -> QueryState {
    let mut state = QueryState::new();
    state.add_metric("Orders.count");
    state.add_time_breakdown("Orders.createdAt", Granularity::Month);
    state
}

fn signups_state() -> QueryState {
    let mut state = QueryState::new();
    state.add_metric("Signups.count");
    state.add_breakdown("Signups.channel");
    state
}

#[test]
fn test_concat_keeps_each_querys_own_breakdowns() {
    let states = vec![orders_state(), signups_state()];
    let config = build_multi_query_config(&states, MergeStrategy::Concat).expect("multi query");

    assert_eq!(config.queries.len(), 2);
    assert_eq!(config.merge_keys, None);
    assert_eq!(
        config.queries[1].dimensions,
        Some(vec!["Signups.channel".to_string()])
    );
    assert_eq!(config.query_labels, vec!["Query 1", "Query 2"]);
}

#[test]
fn test_merge_substitutes_first_querys_breakdowns() {
    let states = vec![orders_state(), signups_state()];
    let queries = build_all_queries(&states, MergeStrategy::Merge);

    // The second query is grouped by the first query's time breakdown, not
    // by its own channel dimension.
    assert_eq!(queries[1].dimensions, None);
    let tds = queries[1].time_dimensions.as_ref().expect("time dimensions");
    assert_eq!(tds[0].dimension, "Orders.createdAt");
    assert_eq!(tds[0].granularity, Some(Granularity::Month));

    // The state itself keeps its stored breakdowns.
    assert_eq!(states[1].breakdowns.len(), 1);
    assert_eq!(states[1].breakdowns[0].field, "Signups.channel");
}

#[test]
fn test_merge_keys_come_from_the_first_state() {
    let states = vec![orders_state(), signups_state()];
    let config = build_multi_query_config(&states, MergeStrategy::Merge).expect("multi query");
    assert_eq!(
        config.merge_keys,
        Some(vec!["Orders.createdAt".to_string()])
    );
}

#[test]
fn test_empty_states_do_not_count_toward_multi_query() {
    let states = vec![orders_state(), QueryState::new(), QueryState::new()];
    assert!(!is_multi_query_mode(&states));
    assert_eq!(build_multi_query_config(&states, MergeStrategy::Concat), None);
}

#[test]
fn test_labels_skip_empty_states_but_keep_positions() {
    let states = vec![orders_state(), QueryState::new(), signups_state()];
    let config = build_multi_query_config(&states, MergeStrategy::Concat).expect("multi query");

    assert_eq!(config.queries.len(), 2);
    assert_eq!(config.query_labels, vec!["Query 1", "Query 3"]);
}
