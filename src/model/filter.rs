//! Filter model: an explicit tagged union of simple conditions and
//! recursive and/or groups.
//!
//! All traversal (member extraction, server-format conversion) is done with
//! exhaustive matches so a new variant cannot be silently skipped.

use serde::{Deserialize, Serialize};

use super::compiled::ServerFilter;

/// A date range, either a relative phrase or an explicit span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateRange {
    /// Relative phrase understood by the server, e.g. `"last 30 days"`.
    Relative(String),
    /// Explicit `[from, to]` span of ISO dates.
    Span(String, String),
}

/// Comparison operator of a simple filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    Gt,
    Gte,
    Lt,
    Lte,
    Set,
    NotSet,
    InDateRange,
    BeforeDate,
    AfterDate,
}

/// Combinator of a filter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLogic {
    And,
    Or,
}

/// A single member/operator/values condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleFilter {
    pub member: String,
    pub operator: FilterOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl SimpleFilter {
    pub fn equals(member: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            operator: FilterOperator::Equals,
            values: vec![value.into()],
            date_range: None,
        }
    }
}

/// A filter: either a simple condition or a recursive group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Simple(SimpleFilter),
    Group {
        logic: FilterLogic,
        filters: Vec<Filter>,
    },
}

impl Filter {
    /// All member fields referenced by this filter, depth first.
    pub fn members(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_members(&mut out);
        out
    }

    fn collect_members<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::Simple(f) => out.push(f.member.as_str()),
            Filter::Group { filters, .. } => {
                for f in filters {
                    f.collect_members(out);
                }
            }
        }
    }

    /// Convert to the server wire format.
    pub fn to_server(&self) -> ServerFilter {
        match self {
            Filter::Simple(f) => ServerFilter::Simple {
                member: f.member.clone(),
                operator: f.operator,
                values: f.values.clone(),
                date_range: f.date_range.clone(),
            },
            Filter::Group { logic, filters } => {
                let inner = filters.iter().map(Filter::to_server).collect();
                match logic {
                    FilterLogic::And => ServerFilter::And { and: inner },
                    FilterLogic::Or => ServerFilter::Or { or: inner },
                }
            }
        }
    }
}

impl From<SimpleFilter> for Filter {
    fn from(f: SimpleFilter) -> Self {
        Filter::Simple(f)
    }
}
