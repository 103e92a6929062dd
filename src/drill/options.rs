//! Computes the drill candidates offered for a clicked data point.

use super::DataPointClick;
use crate::metadata::MetaSnapshot;
use crate::model::{CompiledQuery, Granularity};

/// One entry of the drill menu.
#[derive(Debug, Clone, PartialEq)]
pub enum DrillOption {
    /// Refine the time axis to a finer granularity.
    Granularity(Granularity),
    /// Descend one hierarchy level from a displayed dimension.
    Dimension(String),
    /// Expand the clicked measure into its declared drill members.
    Member { measure: String, fields: Vec<String> },
}

/// Candidates for `click` against `query`, ordered granularities first,
/// then hierarchy descents in dimension order, then the member expansion.
pub(super) fn compute_drill_options(
    query: &CompiledQuery,
    click: &DataPointClick,
    meta: &MetaSnapshot,
    base_granularity: Option<Granularity>,
    drill_active: bool,
) -> Vec<DrillOption> {
    let mut options = Vec::new();

    // Only queries with a time axis can refine granularity, and only below
    // the granularity in effect before drilling began. With a drill active
    // the pre-drill granularity is also offered, as the way back to the
    // root.
    if query.time_dimension().is_some() {
        if let Some(base) = base_granularity {
            options.extend(
                Granularity::ALL
                    .iter()
                    .copied()
                    .filter(|g| g.finer_than(base) || (drill_active && *g == base))
                    .map(DrillOption::Granularity),
            );
        }
    }

    if let Some(dimensions) = &query.dimensions {
        for dimension in dimensions {
            if let Some(next) = meta.next_hierarchy_level(dimension) {
                options.push(DrillOption::Dimension(next.to_string()));
            }
        }
    }

    if let Some(measure) = &click.measure {
        if let Some(field) = meta.field(measure) {
            if !field.drill_members.is_empty() {
                options.push(DrillOption::Member {
                    measure: measure.clone(),
                    fields: field.drill_members.clone(),
                });
            }
        }
    }

    options
}
