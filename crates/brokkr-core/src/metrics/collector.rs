//! Process-wide metrics collector

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::operation::OperationMetrics;
use super::stats::{AggregateStats, StatisticsSummary, StatsSnapshot};

/// Collects outcome statistics for coordinated operations
///
/// One collector instance is shared process-wide. Recording never blocks
/// and never fails: global counters are atomics, and per-type / per-resource
/// buckets are atomics behind an `Arc`, so concurrent recorders only meet a
/// lock on the first sighting of a new key.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    total_operations: AtomicU64,
    successful_operations: AtomicU64,
    failed_operations: AtomicU64,
    total_retries: AtomicU64,
    total_wait_ms: AtomicU64,
    operation_stats: RwLock<HashMap<String, Arc<AggregateStats>>>,
    resource_stats: RwLock<HashMap<String, Arc<AggregateStats>>>,
}

impl MetricsCollector {
    /// Create a new collector with zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a new operation
    ///
    /// Bumps the running total and returns the lifecycle record to feed
    /// retries into and to finalize via [`record_success`] /
    /// [`record_failure`].
    ///
    /// [`record_success`]: MetricsCollector::record_success
    /// [`record_failure`]: MetricsCollector::record_failure
    pub fn start_operation(
        &self,
        operation_type: impl Into<String>,
        resource_key: impl Into<String>,
    ) -> Arc<OperationMetrics> {
        let metrics = Arc::new(OperationMetrics::start(operation_type, resource_key));
        let total = self.total_operations.fetch_add(1, Ordering::Relaxed) + 1;

        tracing::debug!(
            operation = metrics.operation_type(),
            resource = metrics.resource_key(),
            total_operations = total,
            "operation started"
        );

        metrics
    }

    /// Finalize an operation as successful and fold it into the aggregates
    pub fn record_success(&self, metrics: &OperationMetrics) {
        if !metrics.mark_completed() {
            tracing::warn!(
                operation = metrics.operation_type(),
                resource = metrics.resource_key(),
                "operation already finalized, ignoring duplicate success"
            );
            return;
        }

        self.successful_operations.fetch_add(1, Ordering::Relaxed);
        self.fold(metrics, true);

        tracing::debug!(
            operation = metrics.operation_type(),
            resource = metrics.resource_key(),
            retries = metrics.retry_count(),
            duration_ms = metrics.elapsed_ms(),
            "operation succeeded"
        );
    }

    /// Finalize an operation as failed and fold it into the aggregates
    pub fn record_failure(
        &self,
        metrics: &OperationMetrics,
        reason: &str,
        cause: Option<&(dyn Error + 'static)>,
    ) {
        if !metrics.mark_completed() {
            tracing::warn!(
                operation = metrics.operation_type(),
                resource = metrics.resource_key(),
                "operation already finalized, ignoring duplicate failure"
            );
            return;
        }

        self.failed_operations.fetch_add(1, Ordering::Relaxed);
        self.fold(metrics, false);

        match cause {
            Some(cause) => tracing::warn!(
                operation = metrics.operation_type(),
                resource = metrics.resource_key(),
                retries = metrics.retry_count(),
                reason = reason,
                cause = %cause,
                "operation failed"
            ),
            None => tracing::warn!(
                operation = metrics.operation_type(),
                resource = metrics.resource_key(),
                retries = metrics.retry_count(),
                reason = reason,
                "operation failed"
            ),
        }
    }

    fn fold(&self, metrics: &OperationMetrics, success: bool) {
        let duration_ms = metrics.elapsed_ms();
        let retries = metrics.retry_count();
        let wait_ms = metrics.total_wait_ms();

        self.total_retries
            .fetch_add(retries as u64, Ordering::Relaxed);
        self.total_wait_ms.fetch_add(wait_ms, Ordering::Relaxed);

        Self::bucket(&self.operation_stats, metrics.operation_type())
            .record_execution(duration_ms, retries, wait_ms, success);
        Self::bucket(&self.resource_stats, metrics.resource_key())
            .record_execution(duration_ms, retries, wait_ms, success);
    }

    /// Fetch the bucket for a key, creating it on first sight.
    fn bucket(
        map: &RwLock<HashMap<String, Arc<AggregateStats>>>,
        key: &str,
    ) -> Arc<AggregateStats> {
        if let Some(stats) = map.read().get(key) {
            return stats.clone();
        }
        map.write()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AggregateStats::new()))
            .clone()
    }

    /// Snapshot of the global counters
    pub fn overall_statistics(&self) -> StatisticsSummary {
        let total = self.total_operations.load(Ordering::Relaxed);
        let successful = self.successful_operations.load(Ordering::Relaxed);
        let failed = self.failed_operations.load(Ordering::Relaxed);
        let retries = self.total_retries.load(Ordering::Relaxed);
        let wait_ms = self.total_wait_ms.load(Ordering::Relaxed);

        let rate = |num: u64| {
            if total == 0 {
                0.0
            } else {
                num as f64 / total as f64
            }
        };

        StatisticsSummary {
            total_operations: total,
            successful_operations: successful,
            failed_operations: failed,
            total_retries: retries,
            total_wait_ms: wait_ms,
            success_rate: rate(successful) * 100.0,
            average_retries: rate(retries),
            average_wait_ms: rate(wait_ms),
            generated_at: Utc::now(),
        }
    }

    /// Snapshot of one operation type's aggregate (zeroed when unseen)
    pub fn operation_statistics(&self, operation_type: &str) -> StatsSnapshot {
        self.operation_stats
            .read()
            .get(operation_type)
            .map(|stats| stats.snapshot(operation_type))
            .unwrap_or_else(|| StatsSnapshot::empty(operation_type))
    }

    /// Snapshot of one resource key's aggregate (zeroed when unseen)
    pub fn resource_statistics(&self, resource_key: &str) -> StatsSnapshot {
        self.resource_stats
            .read()
            .get(resource_key)
            .map(|stats| stats.snapshot(resource_key))
            .unwrap_or_else(|| StatsSnapshot::empty(resource_key))
    }

    /// Clear all counters and both aggregate maps
    pub fn reset_statistics(&self) {
        let mut operations = self.operation_stats.write();
        let mut resources = self.resource_stats.write();
        self.total_operations.store(0, Ordering::Relaxed);
        self.successful_operations.store(0, Ordering::Relaxed);
        self.failed_operations.store(0, Ordering::Relaxed);
        self.total_retries.store(0, Ordering::Relaxed);
        self.total_wait_ms.store(0, Ordering::Relaxed);
        operations.clear();
        resources.clear();

        tracing::info!("all statistics reset");
    }
}
