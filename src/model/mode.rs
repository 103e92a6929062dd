//! Server query objects for the funnel, flow and retention analysis modes.
//!
//! Unlike the flat [`CompiledQuery`](super::compiled::CompiledQuery), each
//! mode posts a single object wrapped under its mode key
//! (`{"funnel": {...}}`), with the step and filter definitions embedded as
//! structured data. Step sequencing is the server's job.

use serde::{Deserialize, Serialize};

use super::compiled::ServerFilter;
use super::filter::DateRange;
use super::query_state::Granularity;

/// Unit of a funnel conversion window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindowUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

/// A bounded time window, e.g. "within 7 days".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub value: u32,
    pub unit: TimeWindowUnit,
}

/// One compiled funnel step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStepQuery {
    pub name: String,
    pub filters: Vec<ServerFilter>,
}

/// The unified funnel query object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelQuery {
    /// Field correlating rows across steps.
    pub binding_key: String,
    pub time_dimension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub steps: Vec<FunnelStepQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,
}

/// Output shape of a flow query.
///
/// Sunburst requires strictly forward, path-qualified node traversal;
/// sankey tolerates bidirectional exploration and path convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowShape {
    Sunburst,
    Sankey,
}

/// The unified flow query object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowQuery {
    pub binding_key: String,
    pub time_dimension: String,
    /// Dimension holding the event name at each step.
    pub event_dimension: String,
    pub mode: FlowShape,
    /// Steps explored before the starting event. Forced to 0 for sunburst.
    pub steps_before: u32,
    pub steps_after: u32,
    pub starting_filters: Vec<ServerFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

/// The unified retention query object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionQuery {
    pub binding_key: String,
    pub time_dimension: String,
    pub granularity: Granularity,
    pub start_filters: Vec<ServerFilter>,
    pub return_filters: Vec<ServerFilter>,
    pub periods: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

/// A mode query wrapped under its mode key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeQuery {
    Funnel(FunnelQuery),
    Flow(FlowQuery),
    Retention(RetentionQuery),
}
