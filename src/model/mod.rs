//! Data model: builder state, filters, compiled wire queries and chart
//! configuration.

mod chart;
mod compiled;
mod filter;
mod mode;
mod query_state;

pub use chart::{ChartConfig, ChartType};
pub(crate) use compiled::non_empty;
pub use compiled::{CompiledQuery, ServerFilter, TimeDimensionSpec};
pub use filter::{DateRange, Filter, FilterLogic, FilterOperator, SimpleFilter};
pub use mode::{
    FlowQuery, FlowShape, FunnelQuery, FunnelStepQuery, ModeQuery, RetentionQuery, TimeWindow,
    TimeWindowUnit,
};
pub use query_state::{
    metric_label, BreakdownItem, Granularity, MergeStrategy, MetricItem, QueryState, SortDirection,
};
