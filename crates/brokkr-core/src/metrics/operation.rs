//! Per-operation lifecycle record

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::retry::RetryObserver;

/// Live record of one coordinated operation
///
/// Created by [`MetricsCollector::start_operation`], mutated while the
/// operation retries, and finalized exactly once by `record_success` /
/// `record_failure`. Retry tallies are atomic so a renewal sub-task or a
/// retry observer can feed the same record the caller holds.
///
/// [`MetricsCollector::start_operation`]: crate::metrics::MetricsCollector::start_operation
#[derive(Debug)]
pub struct OperationMetrics {
    operation_type: String,
    resource_key: String,
    started_at: DateTime<Utc>,
    started: Instant,
    retry_count: AtomicU32,
    total_wait_ms: AtomicU64,
    completed: AtomicBool,
}

impl OperationMetrics {
    pub(crate) fn start(operation_type: impl Into<String>, resource_key: impl Into<String>) -> Self {
        Self {
            operation_type: operation_type.into(),
            resource_key: resource_key.into(),
            started_at: Utc::now(),
            started: Instant::now(),
            retry_count: AtomicU32::new(0),
            total_wait_ms: AtomicU64::new(0),
            completed: AtomicBool::new(false),
        }
    }

    /// The operation type this record was started with
    pub fn operation_type(&self) -> &str {
        &self.operation_type
    }

    /// The resource key this record was started with
    pub fn resource_key(&self) -> &str {
        &self.resource_key
    }

    /// Wall-clock start time
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Record one retry and the backoff delay it waited
    pub fn record_retry(&self, wait: Duration) {
        self.retry_count.fetch_add(1, Ordering::Relaxed);
        self.total_wait_ms
            .fetch_add(wait.as_millis() as u64, Ordering::Relaxed);
    }

    /// Number of retries recorded so far
    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::Relaxed)
    }

    /// Total backoff wait recorded so far, in milliseconds
    pub fn total_wait_ms(&self) -> u64 {
        self.total_wait_ms.load(Ordering::Relaxed)
    }

    /// Monotonic time elapsed since the operation started, in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Flip the record into its finalized state.
    ///
    /// Returns false when the record was already finalized, so the
    /// collector folds each operation into the aggregates exactly once.
    pub(crate) fn mark_completed(&self) -> bool {
        !self.completed.swap(true, Ordering::SeqCst)
    }
}

/// Feed retry events straight into the lifecycle record.
///
/// Wiring an `Arc<OperationMetrics>` as the executor's observer keeps the
/// retry tally and the terminal outcome on the same record.
impl RetryObserver for OperationMetrics {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn std::error::Error, delay: Duration) {
        self.record_retry(delay);
    }

    fn on_success(&self, _retries: u32, _total_delay: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn std::error::Error) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_tally() {
        let metrics = OperationMetrics::start("deposit", "acct-1");
        assert_eq!(metrics.retry_count(), 0);
        assert_eq!(metrics.total_wait_ms(), 0);

        metrics.record_retry(Duration::from_millis(100));
        metrics.record_retry(Duration::from_millis(250));

        assert_eq!(metrics.retry_count(), 2);
        assert_eq!(metrics.total_wait_ms(), 350);
    }

    #[test]
    fn test_mark_completed_once() {
        let metrics = OperationMetrics::start("deposit", "acct-1");
        assert!(metrics.mark_completed());
        assert!(!metrics.mark_completed());
    }

    #[test]
    fn test_observer_bridge_records_retries() {
        let metrics = OperationMetrics::start("withdraw", "acct-2");
        let err = std::io::Error::other("lock timeout");

        metrics.on_attempt_failed(1, &err, Duration::from_millis(100));
        metrics.on_attempt_failed(2, &err, Duration::from_millis(200));
        metrics.on_success(2, Duration::from_millis(300));

        assert_eq!(metrics.retry_count(), 2);
        assert_eq!(metrics.total_wait_ms(), 300);
    }
}
