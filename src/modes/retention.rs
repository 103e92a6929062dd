//! Retention mode: cohorts defined by a start event, tracked across
//! periods by a return event.

use serde::{Deserialize, Serialize};

use super::ValidationReport;
use crate::model::{DateRange, Filter, Granularity, ModeQuery, RetentionQuery};

/// Editable retention configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetentionState {
    pub binding_key: Option<String>,
    pub time_dimension: Option<String>,
    /// Cohort period size.
    pub granularity: Granularity,
    pub start_filters: Vec<Filter>,
    pub return_filters: Vec<Filter>,
    /// Number of periods tracked after the cohort period.
    pub periods: u32,
    pub date_range: Option<DateRange>,
}

impl Default for RetentionState {
    fn default() -> Self {
        Self {
            binding_key: None,
            time_dimension: None,
            granularity: Granularity::Week,
            start_filters: Vec::new(),
            return_filters: Vec::new(),
            periods: 12,
            date_range: None,
        }
    }
}

impl RetentionState {
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.binding_key.is_none() {
            errors.push("retention binding key is not set".to_string());
        }
        if self.time_dimension.is_none() {
            errors.push("retention time dimension is not set".to_string());
        }
        if self.start_filters.is_empty() {
            errors.push("retention has no start filters".to_string());
        }
        if self.return_filters.is_empty() {
            errors.push("retention has no return filters".to_string());
        }
        if self.periods == 0 {
            warnings.push("retention tracks zero periods".to_string());
        }

        ValidationReport::collect(errors, warnings)
    }

    /// Compile to the unified retention query, or `None` when not ready.
    pub fn compile(&self) -> Option<ModeQuery> {
        if !self.validate().is_valid {
            return None;
        }

        Some(ModeQuery::Retention(RetentionQuery {
            binding_key: self.binding_key.clone()?,
            time_dimension: self.time_dimension.clone()?,
            granularity: self.granularity,
            start_filters: self.start_filters.iter().map(Filter::to_server).collect(),
            return_filters: self.return_filters.iter().map(Filter::to_server).collect(),
            periods: self.periods,
            date_range: self.date_range.clone(),
        }))
    }
}
