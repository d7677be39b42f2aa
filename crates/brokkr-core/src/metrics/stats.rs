//! Lock-free outcome aggregates and their snapshots

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sentinel for "no duration recorded yet"
const MIN_UNSET: u64 = u64::MAX;

/// One aggregate bucket, keyed by operation type or by resource
///
/// Every field is atomic; recorders merge without taking any lock. Min and
/// max only tighten: `fetch_min` / `fetch_max` keep them correct under
/// concurrent updates.
#[derive(Debug)]
pub(crate) struct AggregateStats {
    total_executions: AtomicU64,
    successful_executions: AtomicU64,
    failed_executions: AtomicU64,
    total_retries: AtomicU64,
    total_wait_ms: AtomicU64,
    min_duration_ms: AtomicU64,
    max_duration_ms: AtomicU64,
}

impl AggregateStats {
    pub(crate) fn new() -> Self {
        Self {
            total_executions: AtomicU64::new(0),
            successful_executions: AtomicU64::new(0),
            failed_executions: AtomicU64::new(0),
            total_retries: AtomicU64::new(0),
            total_wait_ms: AtomicU64::new(0),
            min_duration_ms: AtomicU64::new(MIN_UNSET),
            max_duration_ms: AtomicU64::new(0),
        }
    }

    /// Merge one finalized operation into this bucket.
    pub(crate) fn record_execution(
        &self,
        duration_ms: u64,
        retries: u32,
        wait_ms: u64,
        success: bool,
    ) {
        self.total_executions.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_executions.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_executions.fetch_add(1, Ordering::Relaxed);
        }
        self.total_retries
            .fetch_add(retries as u64, Ordering::Relaxed);
        self.total_wait_ms.fetch_add(wait_ms, Ordering::Relaxed);
        self.min_duration_ms.fetch_min(duration_ms, Ordering::Relaxed);
        self.max_duration_ms.fetch_max(duration_ms, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, key: &str) -> StatsSnapshot {
        let min = self.min_duration_ms.load(Ordering::Relaxed);
        StatsSnapshot {
            key: key.to_string(),
            total_executions: self.total_executions.load(Ordering::Relaxed),
            successful_executions: self.successful_executions.load(Ordering::Relaxed),
            failed_executions: self.failed_executions.load(Ordering::Relaxed),
            total_retries: self.total_retries.load(Ordering::Relaxed),
            total_wait_ms: self.total_wait_ms.load(Ordering::Relaxed),
            min_duration_ms: if min == MIN_UNSET { 0 } else { min },
            max_duration_ms: self.max_duration_ms.load(Ordering::Relaxed),
        }
    }
}

/// Read-only snapshot of one aggregate bucket
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// The operation type or resource key this bucket aggregates
    pub key: String,
    /// Number of finalized operations
    pub total_executions: u64,
    /// Operations that ended in success
    pub successful_executions: u64,
    /// Operations that ended in failure
    pub failed_executions: u64,
    /// Retries summed across operations
    pub total_retries: u64,
    /// Backoff wait summed across operations, in milliseconds
    pub total_wait_ms: u64,
    /// Shortest operation duration seen, in milliseconds (0 until first record)
    pub min_duration_ms: u64,
    /// Longest operation duration seen, in milliseconds
    pub max_duration_ms: u64,
}

impl StatsSnapshot {
    pub(crate) fn empty(key: &str) -> Self {
        Self {
            key: key.to_string(),
            total_executions: 0,
            successful_executions: 0,
            failed_executions: 0,
            total_retries: 0,
            total_wait_ms: 0,
            min_duration_ms: 0,
            max_duration_ms: 0,
        }
    }

    /// Success percentage over all finalized operations (0.0 when empty)
    pub fn success_rate(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.successful_executions as f64 / self.total_executions as f64 * 100.0
        }
    }

    /// Mean retries per finalized operation (0.0 when empty)
    pub fn average_retries(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.total_retries as f64 / self.total_executions as f64
        }
    }

    /// Mean backoff wait per finalized operation, in milliseconds
    pub fn average_wait_ms(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.total_wait_ms as f64 / self.total_executions as f64
        }
    }
}

/// Process-wide statistics snapshot across all operation types and resources
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSummary {
    /// Operations started (including ones still in flight)
    pub total_operations: u64,
    /// Operations finalized as success
    pub successful_operations: u64,
    /// Operations finalized as failure
    pub failed_operations: u64,
    /// Retries summed across finalized operations
    pub total_retries: u64,
    /// Backoff wait summed across finalized operations, in milliseconds
    pub total_wait_ms: u64,
    /// Success percentage over started operations
    pub success_rate: f64,
    /// Mean retries per started operation
    pub average_retries: f64,
    /// Mean backoff wait per started operation, in milliseconds
    pub average_wait_ms: f64,
    /// When this snapshot was taken
    pub generated_at: DateTime<Utc>,
}
