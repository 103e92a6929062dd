//! Integration tests for funnel validation and compilation.

use prism::model::{ModeQuery, SimpleFilter, TimeWindow, TimeWindowUnit};
use prism::modes::{FunnelState, FunnelStep};

fn ready_funnel() -> FunnelState {
    FunnelState {
        binding_key: Some("Events.userId".to_string()),
        time_dimension: Some("Events.timestamp".to_string()),
        steps: vec![
            FunnelStep {
                name: "Visit".to_string(),
                filters: vec![SimpleFilter::equals("Events.name", "page_view").into()],
            },
            FunnelStep {
                name: "Signup".to_string(),
                filters: vec![SimpleFilter::equals("Events.name", "signup").into()],
            },
            FunnelStep {
                name: "Purchase".to_string(),
                filters: vec![SimpleFilter::equals("Events.name", "purchase").into()],
            },
        ],
        window: Some(TimeWindow {
            value: 7,
            unit: TimeWindowUnit::Day,
        }),
        ..Default::default()
    }
}

#[test]
fn test_ready_funnel_compiles_to_one_wrapped_query() {
    let query = ready_funnel().compile().expect("ready");
    let json = serde_json::to_value(&query).unwrap();

    let funnel = json.get("funnel").expect("funnel key");
    assert_eq!(funnel["bindingKey"], "Events.userId");
    assert_eq!(funnel["timeDimension"], "Events.timestamp");
    assert_eq!(funnel["steps"].as_array().unwrap().len(), 3);
    assert_eq!(funnel["steps"][1]["name"], "Signup");
    assert_eq!(funnel["window"]["value"], 7);
}

#[test]
fn test_missing_binding_key_blocks_compilation() {
    let mut state = ready_funnel();
    state.binding_key = None;

    let report = state.validate();
    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains("binding key")));
    assert_eq!(state.compile(), None);
}

#[test]
fn test_empty_first_step_is_an_error() {
    let mut state = ready_funnel();
    state.steps[0].filters.clear();

    let report = state.validate();
    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains("first")));
}

#[test]
fn test_empty_later_step_is_only_a_warning() {
    let mut state = ready_funnel();
    state.steps[2].filters.clear();

    let report = state.validate();
    assert!(report.is_valid);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Purchase"));

    match state.compile() {
        Some(ModeQuery::Funnel(q)) => assert!(q.steps[2].filters.is_empty()),
        other => panic!("expected funnel query, got {other:?}"),
    }
}

#[test]
fn test_no_steps_is_an_error() {
    let state = FunnelState {
        binding_key: Some("Events.userId".to_string()),
        time_dimension: Some("Events.timestamp".to_string()),
        ..Default::default()
    };

    let report = state.validate();
    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains("no steps")));
}

#[test]
fn test_absent_window_is_omitted_from_the_wire() {
    let mut state = ready_funnel();
    state.window = None;

    let json = serde_json::to_value(state.compile().expect("ready")).unwrap();
    assert!(json["funnel"].get("window").is_none());
}
