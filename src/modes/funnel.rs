//! Funnel mode: ordered steps correlated by a binding key.

use serde::{Deserialize, Serialize};

use super::ValidationReport;
use crate::model::{
    DateRange, Filter, FunnelQuery, FunnelStepQuery, ModeQuery, TimeWindow,
};

/// One editable funnel step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunnelStep {
    pub name: String,
    pub filters: Vec<Filter>,
}

/// Editable funnel configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunnelState {
    /// Field correlating events across steps (e.g. a user id).
    pub binding_key: Option<String>,
    pub time_dimension: Option<String>,
    pub date_range: Option<DateRange>,
    pub steps: Vec<FunnelStep>,
    /// Conversion window; unbounded when absent.
    pub window: Option<TimeWindow>,
}

impl FunnelState {
    /// Check whether the configuration is complete enough to query.
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.binding_key.is_none() {
            errors.push("funnel binding key is not set".to_string());
        }
        if self.time_dimension.is_none() {
            errors.push("funnel time dimension is not set".to_string());
        }
        match self.steps.first() {
            None => errors.push("funnel has no steps".to_string()),
            Some(first) if first.filters.is_empty() => {
                errors.push("first funnel step has no filters".to_string());
            }
            Some(_) => {}
        }
        for (i, step) in self.steps.iter().enumerate().skip(1) {
            if step.filters.is_empty() {
                warnings.push(format!("step {} ({}) has no filters", i + 1, step.name));
            }
        }

        ValidationReport::collect(errors, warnings)
    }

    /// Compile to the unified funnel query, or `None` when not ready.
    ///
    /// The step list is embedded as structured data inside a single wrapped
    /// query; one funnel is one request, not one request per step.
    pub fn compile(&self) -> Option<ModeQuery> {
        if !self.validate().is_valid {
            return None;
        }

        // validate() guarantees these are present.
        let binding_key = self.binding_key.clone()?;
        let time_dimension = self.time_dimension.clone()?;

        let steps = self
            .steps
            .iter()
            .map(|step| FunnelStepQuery {
                name: step.name.clone(),
                filters: step.filters.iter().map(Filter::to_server).collect(),
            })
            .collect();

        Some(ModeQuery::Funnel(FunnelQuery {
            binding_key,
            time_dimension,
            date_range: self.date_range.clone(),
            steps,
            window: self.window,
        }))
    }
}
