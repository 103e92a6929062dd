//! # Prism
//!
//! Analysis query compilation and execution coordination for semantic
//! data APIs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              QueryStore (editable states)                │
//! │    (metrics, breakdowns, filters, order, merge mode)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [builder]
//! ┌─────────────────────────────────────────────────────────┐
//! │        CompiledQuery (flat server wire object)           │
//! │        + merge coordinator (multi-query payloads)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [exec]
//! ┌─────────────────────────────────────────────────────────┐
//! │   ExecutionCoordinator (debounce, request tokens)        │
//! │   + BatchCoordinator (same-window request coalescing)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [api]
//! ┌─────────────────────────────────────────────────────────┐
//! │              Semantic query API (HTTP)                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Funnel, flow and retention configurations compile through [`modes`]
//! into single wrapped queries; [`drill`] rewrites compiled queries along
//! a navigable drill-down path.

pub mod api;
pub mod batch;
pub mod builder;
pub mod config;
pub mod drill;
pub mod exec;
pub mod metadata;
pub mod model;
pub mod modes;
pub mod store;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::api::{ApiError, ApiResult, QueryApiClient, QueryResult};
    pub use crate::batch::{BatchCoordinator, BatchError, BatchResult};
    pub use crate::builder::{build, build_multi_query_config, is_multi_query_mode};
    pub use crate::config::Settings;
    pub use crate::drill::{DataPointClick, DrillEngine, DrillOption, DrillTransition};
    pub use crate::exec::{
        AnalysisMode, AnalysisSnapshot, ExecutionCoordinator, ExecutionOutcome, ExecutionState,
    };
    pub use crate::metadata::{MetaCache, MetaProvider, MetaSnapshot};
    pub use crate::model::{
        ChartConfig, ChartType, CompiledQuery, Filter, Granularity, MergeStrategy, ModeQuery,
        QueryState, SimpleFilter, SortDirection,
    };
    pub use crate::modes::{FlowState, FunnelState, RetentionState, ValidationReport};
    pub use crate::store::{QueryAction, QueryStore, StoreAction};
}
