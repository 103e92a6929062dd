//! Mode compilers: funnel, flow and retention.
//!
//! Each compiler validates its configuration before compiling and returns
//! `None` rather than emitting a partial query. Validation results are
//! structured values, never errors: an incomplete funnel is a normal
//! editing state, not a fault.

mod flow;
mod funnel;
mod retention;

pub use flow::FlowState;
pub use funnel::{FunnelState, FunnelStep};
pub use retention::RetentionState;

use serde::{Deserialize, Serialize};

/// Outcome of validating a mode configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub(crate) fn collect(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}
