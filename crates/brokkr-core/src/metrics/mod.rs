//! Concurrent operation metrics collection
//!
//! This module records the lifecycle of coordinated operations (start,
//! retries, terminal success or failure) and aggregates outcomes per
//! operation type and per resource key. All counter updates go through
//! atomics so concurrent recorders never serialize; the aggregate maps
//! take a short write lock only when a key is first seen.

mod collector;
mod operation;
mod stats;

pub use collector::MetricsCollector;
pub use operation::OperationMetrics;
pub use stats::{StatisticsSummary, StatsSnapshot};
