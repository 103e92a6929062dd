//! Integration tests for flow validation and compilation.

use prism::model::{ChartType, FlowShape, ModeQuery, SimpleFilter};
use prism::modes::FlowState;

fn ready_flow() -> FlowState {
    FlowState {
        binding_key: Some("Events.userId".to_string()),
        time_dimension: Some("Events.timestamp".to_string()),
        event_dimension: Some("Events.name".to_string()),
        starting_filters: vec![SimpleFilter::equals("Events.name", "checkout").into()],
        steps_before: 2,
        steps_after: 4,
        ..Default::default()
    }
}

#[test]
fn test_sankey_chart_compiles_bidirectional_flow() {
    match ready_flow().compile(ChartType::Sankey) {
        Some(ModeQuery::Flow(q)) => {
            assert_eq!(q.mode, FlowShape::Sankey);
            assert_eq!(q.steps_before, 2);
            assert_eq!(q.steps_after, 4);
            assert_eq!(q.event_dimension, "Events.name");
        }
        other => panic!("expected flow query, got {other:?}"),
    }
}

#[test]
fn test_sunburst_chart_forces_forward_only_flow() {
    match ready_flow().compile(ChartType::Sunburst) {
        Some(ModeQuery::Flow(q)) => {
            assert_eq!(q.mode, FlowShape::Sunburst);
            assert_eq!(q.steps_before, 0);
            assert_eq!(q.steps_after, 4);
        }
        other => panic!("expected flow query, got {other:?}"),
    }
}

#[test]
fn test_non_flow_chart_falls_back_to_sankey_shape() {
    match ready_flow().compile(ChartType::Line) {
        Some(ModeQuery::Flow(q)) => assert_eq!(q.mode, FlowShape::Sankey),
        other => panic!("expected flow query, got {other:?}"),
    }
}

#[test]
fn test_each_missing_requirement_is_reported() {
    let state = FlowState::default();
    let report = state.validate();

    assert!(!report.is_valid);
    assert_eq!(report.errors.len(), 4);
    assert_eq!(state.compile(ChartType::Sankey), None);
}

#[test]
fn test_missing_starting_filters_blocks_compilation() {
    let mut state = ready_flow();
    state.starting_filters.clear();

    let report = state.validate();
    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains("starting")));
    assert_eq!(state.compile(ChartType::Sunburst), None);
}

#[test]
fn test_wire_shape_wraps_under_flow_key() {
    let query = ready_flow().compile(ChartType::Sankey).expect("ready");
    let json = serde_json::to_value(&query).unwrap();

    let flow = json.get("flow").expect("flow key");
    assert_eq!(flow["mode"], "sankey");
    assert_eq!(flow["stepsBefore"], 2);
    assert_eq!(flow["startingFilters"][0]["operator"], "equals");
}
