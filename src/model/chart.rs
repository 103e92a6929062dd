//! Chart configuration consumed by the drill engine and the flow compiler.
//!
//! Rendering itself is out of scope; this is only the slice of chart state
//! that influences query shape (flow output mode) or that the drill engine
//! must snapshot and restore.

use serde::{Deserialize, Serialize};

use super::query_state::Granularity;

/// Active chart type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Area,
    Pie,
    Table,
    Sunburst,
    Sankey,
}

/// The query-relevant chart state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub chart_type: ChartType,
    /// Granularity shown on the time axis, if the chart has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
}

impl ChartConfig {
    pub fn new(chart_type: ChartType) -> Self {
        Self {
            chart_type,
            granularity: None,
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }
}
