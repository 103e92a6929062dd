//! Builder-side query state: metrics, breakdowns, filters and sort order.
//!
//! One `QueryState` exists per open query tab. It is the mutable input to
//! the query builder; the builder itself never writes back into it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::filter::Filter;

/// Time bucketing granularity for a time breakdown.
///
/// Variants are ordered finest-first, so the derived `Ord` makes
/// `Granularity::Day < Granularity::Month` hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    /// All granularities, finest first.
    pub const ALL: [Granularity; 8] = [
        Granularity::Second,
        Granularity::Minute,
        Granularity::Hour,
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Quarter,
        Granularity::Year,
    ];

    /// True if `self` buckets time more finely than `other`.
    pub fn finer_than(self, other: Granularity) -> bool {
        self < other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Second => "second",
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
        }
    }
}

/// Sort direction for an order entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A selected measure with a stable display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricItem {
    pub id: Uuid,
    /// Semantic field reference, e.g. `Orders.count`.
    pub field: String,
    /// Display label (auto-assigned A, B, C, ... or user supplied).
    pub label: String,
}

/// A grouping dimension, either ordinary or time-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownItem {
    pub id: Uuid,
    pub field: String,
    pub is_time_dimension: bool,
    /// Present iff `is_time_dimension`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
    /// Time dimensions only: compare against the previous period.
    #[serde(default)]
    pub enable_comparison: bool,
}

/// How multiple query results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Independent series, rendered side by side.
    #[default]
    Concat,
    /// Aligned on shared breakdown keys taken from the first query.
    Merge,
}

/// The complete editable state of one query tab.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryState {
    pub metrics: Vec<MetricItem>,
    pub breakdowns: Vec<BreakdownItem>,
    pub filters: Vec<Filter>,
    /// Ordered field -> direction entries (insertion order is meaningful).
    pub order: Vec<(String, SortDirection)>,
    /// Monotonic counter for metric label assignment. Never decremented, so
    /// a removed metric's label is never handed out again.
    pub label_seq: u32,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the state contributes nothing to a query.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.breakdowns.is_empty()
    }

    /// The single time breakdown, if one is configured.
    pub fn time_breakdown(&self) -> Option<&BreakdownItem> {
        self.breakdowns.iter().find(|b| b.is_time_dimension)
    }

    /// Append a metric, assigning the next label from the sequence.
    pub fn add_metric(&mut self, field: impl Into<String>) -> &MetricItem {
        let label = metric_label(self.label_seq);
        self.label_seq += 1;
        self.metrics.push(MetricItem {
            id: Uuid::new_v4(),
            field: field.into(),
            label,
        });
        self.metrics.last().expect("just pushed")
    }

    /// Append an ordinary breakdown.
    pub fn add_breakdown(&mut self, field: impl Into<String>) -> &BreakdownItem {
        self.breakdowns.push(BreakdownItem {
            id: Uuid::new_v4(),
            field: field.into(),
            is_time_dimension: false,
            granularity: None,
            enable_comparison: false,
        });
        self.breakdowns.last().expect("just pushed")
    }

    /// Append a time breakdown, replacing any existing one.
    ///
    /// At most one breakdown per state may be a time dimension.
    pub fn add_time_breakdown(
        &mut self,
        field: impl Into<String>,
        granularity: Granularity,
    ) -> &BreakdownItem {
        self.breakdowns.retain(|b| !b.is_time_dimension);
        self.breakdowns.push(BreakdownItem {
            id: Uuid::new_v4(),
            field: field.into(),
            is_time_dimension: true,
            granularity: Some(granularity),
            enable_comparison: false,
        });
        self.breakdowns.last().expect("just pushed")
    }
}

/// Label for the `seq`-th assigned metric: A..Z, then AA, AB, ...
pub fn metric_label(seq: u32) -> String {
    let mut n = seq as i64;
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (n % 26) as u8);
        n = n / 26 - 1;
        if n < 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8(out).expect("ascii")
}
