//! Drill-down interaction engine.
//!
//! A click-driven state machine that rewrites the active query along a
//! navigable breadcrumb path. The engine owns the drill path (a stack of
//! post-drill snapshots) and a one-shot pristine snapshot of the query,
//! chart config and time granularity, captured exactly once on the first
//! drill of a session. Subsequent drills mutate the live query, so no later
//! recomputation can reconstruct the original; the snapshot is the only
//! way back.
//!
//! If drill-query construction fails the interaction aborts with zero
//! state mutation: the path, the snapshots and the active query all remain
//! exactly as they were before the click.

mod options;
mod query;

pub use options::DrillOption;

use std::collections::BTreeMap;

use tracing::warn;

use crate::metadata::MetaSnapshot;
use crate::model::{ChartConfig, CompiledQuery, Filter, Granularity};

use query::{build_drill_query, DrillRewrite};

/// A clicked chart data point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPointClick {
    /// Measure (series) the point belongs to.
    pub measure: Option<String>,
    /// Dimension values at the clicked point, keyed by field.
    pub values: BTreeMap<String, String>,
    /// X-axis time value, if the chart has a time axis.
    pub time_value: Option<String>,
}

/// What one drill narrowed by; keys re-entrancy detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrillTarget {
    Granularity(Granularity),
    Dimension(String),
}

/// One level of the drill path: the query and chart state that existed
/// immediately after that drill was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillPathEntry {
    pub query: CompiledQuery,
    pub chart: ChartConfig,
    pub target: DrillTarget,
}

/// The query/chart rewrite the caller should apply.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillTransition {
    pub query: CompiledQuery,
    pub chart: ChartConfig,
}

/// Errors during drill-query construction. Callers of the engine never see
/// these; they are caught, logged and turn into an aborted interaction.
#[derive(Debug, thiserror::Error)]
pub enum DrillError {
    #[error("query has no time dimension to refine")]
    NoTimeDimension,

    #[error("unknown field: {0}")]
    UnknownField(String),
}

#[derive(Debug, Clone)]
struct PristineSnapshot {
    query: CompiledQuery,
    chart: ChartConfig,
    granularity: Option<Granularity>,
}

#[derive(Debug, Clone)]
enum MenuState {
    Idle,
    MenuOpen {
        click: DataPointClick,
        options: Vec<DrillOption>,
        /// Dashboard filters applicable to the drilled query, resolved at
        /// click time.
        applicable_filters: Vec<Filter>,
    },
}

/// The drill-down state machine.
pub struct DrillEngine {
    state: MenuState,
    path: Vec<DrillPathEntry>,
    pristine: Option<PristineSnapshot>,
}

impl Default for DrillEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DrillEngine {
    pub fn new() -> Self {
        Self {
            state: MenuState::Idle,
            path: Vec::new(),
            pristine: None,
        }
    }

    pub fn is_menu_open(&self) -> bool {
        matches!(self.state, MenuState::MenuOpen { .. })
    }

    /// Options of the open menu; empty when idle.
    pub fn options(&self) -> &[DrillOption] {
        match &self.state {
            MenuState::MenuOpen { options, .. } => options,
            MenuState::Idle => &[],
        }
    }

    pub fn path(&self) -> &[DrillPathEntry] {
        &self.path
    }

    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    /// The granularity in effect before any drilling began, falling back to
    /// the current chart when no drill is active.
    fn base_granularity(&self, chart: &ChartConfig) -> Option<Granularity> {
        match &self.pristine {
            Some(p) => p.granularity,
            None => chart.granularity,
        }
    }

    /// Handle a data-point click, opening the menu when at least one drill
    /// candidate exists. Returns whether the menu opened.
    pub fn handle_click(
        &mut self,
        click: DataPointClick,
        query: &CompiledQuery,
        chart: &ChartConfig,
        meta: &MetaSnapshot,
        dashboard_filters: &[Filter],
    ) -> bool {
        let options = options::compute_drill_options(
            query,
            &click,
            meta,
            self.base_granularity(chart),
            !self.path.is_empty(),
        );
        if options.is_empty() {
            self.state = MenuState::Idle;
            return false;
        }

        let applicable_filters = dashboard_filters
            .iter()
            .filter(|f| f.members().iter().all(|m| meta.contains(m)))
            .cloned()
            .collect();

        self.state = MenuState::MenuOpen {
            click,
            options,
            applicable_filters,
        };
        true
    }

    /// Close the menu without selecting anything.
    pub fn dismiss(&mut self) {
        self.state = MenuState::Idle;
    }

    /// Select a menu option. Resolution order, first match wins:
    ///
    /// 1. re-entrant granularity: truncate back to the existing depth;
    /// 2. root-return by granularity: full root restoration;
    /// 3. re-entrant dimension: same truncation rule;
    /// 4. new drill: build a strictly narrower query and push a path entry.
    ///
    /// Returns the transition to apply, or `None` when the interaction is a
    /// no-op (engine idle, nothing to restore, or construction failed).
    pub fn select(
        &mut self,
        option: &DrillOption,
        query: &CompiledQuery,
        chart: &ChartConfig,
        meta: &MetaSnapshot,
    ) -> Option<DrillTransition> {
        let (click, applicable_filters) = match std::mem::replace(&mut self.state, MenuState::Idle)
        {
            MenuState::MenuOpen {
                click,
                applicable_filters,
                ..
            } => (click, applicable_filters),
            MenuState::Idle => {
                warn!("drill option selected while menu is closed");
                return None;
            }
        };

        match option {
            DrillOption::Granularity(g) => {
                if let Some(depth) = self.find_depth(&DrillTarget::Granularity(*g)) {
                    return self.truncate_to(depth);
                }
                if self.pristine.as_ref().is_some_and(|p| p.granularity == Some(*g)) {
                    return self.restore_root();
                }
                self.push_drill(
                    &click,
                    &applicable_filters,
                    DrillTarget::Granularity(*g),
                    DrillRewrite::Granularity(*g),
                    query,
                    chart,
                    meta,
                )
            }
            DrillOption::Dimension(d) => {
                if let Some(depth) = self.find_depth(&DrillTarget::Dimension(d.clone())) {
                    return self.truncate_to(depth);
                }
                self.push_drill(
                    &click,
                    &applicable_filters,
                    DrillTarget::Dimension(d.clone()),
                    DrillRewrite::Dimension(d.clone()),
                    query,
                    chart,
                    meta,
                )
            }
            DrillOption::Member { fields, .. } => {
                // The path entry records the primary member as a dimension
                // target; entries admit only granularity or dimension.
                let primary = fields.first().cloned()?;
                self.push_drill(
                    &click,
                    &applicable_filters,
                    DrillTarget::Dimension(primary),
                    DrillRewrite::Members(fields.clone()),
                    query,
                    chart,
                    meta,
                )
            }
        }
    }

    /// Pop one path level. An emptied path triggers full root restoration.
    pub fn navigate_back(&mut self) -> Option<DrillTransition> {
        self.state = MenuState::Idle;
        self.path.pop()?;
        match self.path.last() {
            Some(entry) => Some(DrillTransition {
                query: entry.query.clone(),
                chart: entry.chart.clone(),
            }),
            None => self.restore_root(),
        }
    }

    /// Navigate to path level `level`; 0 is the root. Levels beyond the
    /// current depth re-apply the deepest entry.
    pub fn navigate_to_level(&mut self, level: usize) -> Option<DrillTransition> {
        self.state = MenuState::Idle;
        if level == 0 {
            if self.path.is_empty() {
                return None;
            }
            return self.restore_root();
        }
        let depth = level.min(self.path.len());
        if depth == 0 {
            return None;
        }
        self.truncate_to(depth - 1)
    }

    fn find_depth(&self, target: &DrillTarget) -> Option<usize> {
        self.path.iter().position(|entry| &entry.target == target)
    }

    /// Truncate the path to keep `depth` as the last entry and re-apply it.
    fn truncate_to(&mut self, depth: usize) -> Option<DrillTransition> {
        self.path.truncate(depth + 1);
        let entry = self.path.last()?;
        Some(DrillTransition {
            query: entry.query.clone(),
            chart: entry.chart.clone(),
        })
    }

    /// Restore the pristine pre-drill state, clearing the path and the
    /// snapshots. Idempotent: a second call is a no-op.
    fn restore_root(&mut self) -> Option<DrillTransition> {
        let pristine = self.pristine.take()?;
        self.path.clear();
        Some(DrillTransition {
            query: pristine.query,
            chart: pristine.chart,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn push_drill(
        &mut self,
        click: &DataPointClick,
        applicable_filters: &[Filter],
        target: DrillTarget,
        rewrite: DrillRewrite,
        query: &CompiledQuery,
        chart: &ChartConfig,
        meta: &MetaSnapshot,
    ) -> Option<DrillTransition> {
        // Build first: on failure nothing below may run.
        let narrowed = match build_drill_query(query, click, &rewrite, applicable_filters, meta) {
            Ok(q) => q,
            Err(error) => {
                warn!(error = %error, "drill query construction failed; aborting interaction");
                return None;
            }
        };

        if self.path.is_empty() {
            self.pristine = Some(PristineSnapshot {
                query: query.clone(),
                chart: chart.clone(),
                granularity: chart.granularity,
            });
        }

        let next_chart = match &target {
            DrillTarget::Granularity(g) => ChartConfig {
                chart_type: chart.chart_type,
                granularity: Some(*g),
            },
            DrillTarget::Dimension(_) => chart.clone(),
        };

        self.path.push(DrillPathEntry {
            query: narrowed.clone(),
            chart: next_chart.clone(),
            target,
        });

        Some(DrillTransition {
            query: narrowed,
            chart: next_chart,
        })
    }
}
