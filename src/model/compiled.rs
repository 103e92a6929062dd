//! The flat server query object.
//!
//! Wire-compatibility contract: optional keys are omitted entirely when
//! their source is empty, never serialized as `[]` or `{}`. The server
//! treats an empty array differently from an absent key.

use serde::{Deserialize, Serialize};

use super::filter::{DateRange, FilterOperator};
use super::query_state::{Granularity, SortDirection};

/// A filter in server wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerFilter {
    #[serde(rename_all = "camelCase")]
    Simple {
        member: String,
        operator: FilterOperator,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        values: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_range: Option<DateRange>,
    },
    And { and: Vec<ServerFilter> },
    Or { or: Vec<ServerFilter> },
}

/// A time dimension entry of a compiled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeDimensionSpec {
    pub dimension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Previous-period comparison; the server derives the comparison range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<bool>,
}

/// The flat query object sent to the server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompiledQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measures: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_dimensions: Option<Vec<TimeDimensionSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<ServerFilter>>,
    /// Ordered `[field, direction]` pairs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<(String, SortDirection)>>,
}

impl CompiledQuery {
    /// True when the query selects at least one measure, dimension or
    /// time dimension.
    pub fn has_content(&self) -> bool {
        fn some_nonempty<T>(v: &Option<Vec<T>>) -> bool {
            v.as_ref().is_some_and(|v| !v.is_empty())
        }
        some_nonempty(&self.measures)
            || some_nonempty(&self.dimensions)
            || some_nonempty(&self.time_dimensions)
    }

    /// First time dimension, if any.
    pub fn time_dimension(&self) -> Option<&TimeDimensionSpec> {
        self.time_dimensions.as_ref().and_then(|t| t.first())
    }
}

/// `None` for an empty vec, `Some` otherwise. Enforces the omission rule.
pub(crate) fn non_empty<T>(v: Vec<T>) -> Option<Vec<T>> {
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}
