//! Builds the narrowed query for one drill step.
//!
//! Construction is all-or-nothing: the input query is never touched, and
//! any error leaves the caller free to abandon the interaction without
//! cleanup.

use super::{DataPointClick, DrillError};
use crate::metadata::MetaSnapshot;
use crate::model::{
    CompiledQuery, DateRange, Filter, FilterOperator, Granularity, ServerFilter,
};

/// How the drill rewrites the query's grouping.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum DrillRewrite {
    /// Keep dimensions, refine the time axis.
    Granularity(Granularity),
    /// Replace the dimensions with one hierarchy level.
    Dimension(String),
    /// Replace the dimensions with a measure's drill members.
    Members(Vec<String>),
}

/// A strictly narrower query: the clicked point's dimension values become
/// equality filters, the clicked time value pins the date range, and the
/// grouping is rewritten per `rewrite`.
pub(super) fn build_drill_query(
    query: &CompiledQuery,
    click: &DataPointClick,
    rewrite: &DrillRewrite,
    applicable_filters: &[Filter],
    meta: &MetaSnapshot,
) -> Result<CompiledQuery, DrillError> {
    let mut narrowed = query.clone();

    let mut filters = narrowed.filters.take().unwrap_or_default();
    for (field, value) in &click.values {
        if !meta.contains(field) {
            return Err(DrillError::UnknownField(field.clone()));
        }
        filters.push(ServerFilter::Simple {
            member: field.clone(),
            operator: FilterOperator::Equals,
            values: vec![value.clone()],
            date_range: None,
        });
    }
    filters.extend(applicable_filters.iter().map(Filter::to_server));

    match rewrite {
        DrillRewrite::Granularity(g) => {
            let time_dimensions = narrowed
                .time_dimensions
                .as_mut()
                .and_then(|tds| tds.first_mut())
                .ok_or(DrillError::NoTimeDimension)?;
            time_dimensions.granularity = Some(*g);
        }
        DrillRewrite::Dimension(dimension) => {
            if !meta.contains(dimension) {
                return Err(DrillError::UnknownField(dimension.clone()));
            }
            narrowed.dimensions = Some(vec![dimension.clone()]);
        }
        DrillRewrite::Members(fields) => {
            for field in fields {
                if !meta.contains(field) {
                    return Err(DrillError::UnknownField(field.clone()));
                }
            }
            narrowed.dimensions = Some(fields.clone());
        }
    }

    // Pin the time axis to the clicked point so the narrowed query covers
    // exactly the interval the user clicked.
    if let Some(time_value) = &click.time_value {
        if let Some(td) = narrowed
            .time_dimensions
            .as_mut()
            .and_then(|tds| tds.first_mut())
        {
            td.date_range = Some(DateRange::Span(time_value.clone(), time_value.clone()));
        }
    }

    narrowed.filters = if filters.is_empty() {
        None
    } else {
        Some(filters)
    };
    Ok(narrowed)
}
