//! Decides what, if anything, to execute for an analysis snapshot.

use crate::builder::{build, build_multi_query_config, is_multi_query_mode, MultiQueryConfig};
use crate::model::{ChartType, CompiledQuery, ModeQuery};
use crate::modes::ValidationReport;

use super::{AnalysisMode, AnalysisSnapshot};

/// Why a snapshot produced no execution.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The active query selects nothing.
    EmptyQuery,
    /// The active mode configuration failed validation.
    ModeNotReady(ValidationReport),
}

/// What one execution will run.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionPlan {
    Skip(SkipReason),
    Single(CompiledQuery),
    Multi(MultiQueryConfig),
    Mode(ModeQuery),
}

/// Plan the execution for `snapshot`.
///
/// Query mode prefers the multi-query path; when fewer than two states
/// carry content it falls back to the active state as a single query.
/// Modes compile or skip with their validation report; a partial mode
/// query is never emitted.
pub fn plan(snapshot: &AnalysisSnapshot) -> ExecutionPlan {
    match snapshot.mode {
        AnalysisMode::Query => {
            if is_multi_query_mode(&snapshot.store.states) {
                if let Some(config) = build_multi_query_config(
                    &snapshot.store.states,
                    snapshot.store.merge_strategy,
                ) {
                    return ExecutionPlan::Multi(config);
                }
            }
            let query = build(snapshot.store.active_state());
            if query.has_content() {
                ExecutionPlan::Single(query)
            } else {
                ExecutionPlan::Skip(SkipReason::EmptyQuery)
            }
        }
        AnalysisMode::Funnel => match snapshot.funnel.compile() {
            Some(query) => ExecutionPlan::Mode(query),
            None => ExecutionPlan::Skip(SkipReason::ModeNotReady(snapshot.funnel.validate())),
        },
        AnalysisMode::Flow => {
            let chart_type = snapshot
                .chart
                .as_ref()
                .map(|c| c.chart_type)
                .unwrap_or(ChartType::Sankey);
            match snapshot.flow.compile(chart_type) {
                Some(query) => ExecutionPlan::Mode(query),
                None => ExecutionPlan::Skip(SkipReason::ModeNotReady(snapshot.flow.validate())),
            }
        }
        AnalysisMode::Retention => match snapshot.retention.compile() {
            Some(query) => ExecutionPlan::Mode(query),
            None => ExecutionPlan::Skip(SkipReason::ModeNotReady(snapshot.retention.validate())),
        },
    }
}
