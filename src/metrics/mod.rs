//! Window counters, latency percentiles and the periodic summary task.
mod aggregator;
mod histogram;
mod reporter;
mod types;


pub use aggregator::MetricsAggregator;
pub use histogram::LatencyHistogram;
pub use reporter::{log_summary, spawn_summary_reporter, summary_line};
pub use types::{
    ExceptionKind, LatencySummary, MetricsSnapshot, MetricsTotals, RequestOutcome, StatusClass,
};
