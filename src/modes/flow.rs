//! Flow mode: event-path exploration around a starting step.

use serde::{Deserialize, Serialize};

use super::ValidationReport;
use crate::model::{ChartType, DateRange, Filter, FlowQuery, FlowShape, ModeQuery};

/// Editable flow configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowState {
    pub binding_key: Option<String>,
    pub time_dimension: Option<String>,
    /// Dimension holding the event name at each step.
    pub event_dimension: Option<String>,
    pub starting_filters: Vec<Filter>,
    pub steps_before: u32,
    pub steps_after: u32,
    pub date_range: Option<DateRange>,
}

impl FlowState {
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();

        if self.binding_key.is_none() {
            errors.push("flow binding key is not set".to_string());
        }
        if self.time_dimension.is_none() {
            errors.push("flow time dimension is not set".to_string());
        }
        if self.event_dimension.is_none() {
            errors.push("flow event dimension is not set".to_string());
        }
        if self.starting_filters.is_empty() {
            errors.push("flow has no starting-step filters".to_string());
        }

        ValidationReport::collect(errors, Vec::new())
    }

    /// Compile to the unified flow query, or `None` when not ready.
    ///
    /// The output shape follows the active chart type. Sunburst requires
    /// strictly forward, path-qualified traversal, so `steps_before` is
    /// forced to 0 regardless of its configured value; sankey keeps it.
    pub fn compile(&self, chart_type: ChartType) -> Option<ModeQuery> {
        if !self.validate().is_valid {
            return None;
        }

        let mode = match chart_type {
            ChartType::Sunburst => FlowShape::Sunburst,
            _ => FlowShape::Sankey,
        };
        let steps_before = match mode {
            FlowShape::Sunburst => 0,
            FlowShape::Sankey => self.steps_before,
        };

        Some(ModeQuery::Flow(FlowQuery {
            binding_key: self.binding_key.clone()?,
            time_dimension: self.time_dimension.clone()?,
            event_dimension: self.event_dimension.clone()?,
            mode,
            steps_before,
            steps_after: self.steps_after,
            starting_filters: self.starting_filters.iter().map(Filter::to_server).collect(),
            date_range: self.date_range.clone(),
        }))
    }
}
