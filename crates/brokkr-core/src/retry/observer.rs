//! Retry observation and logging
//!
//! This module provides the `RetryObserver` trait for monitoring retry
//! attempts and a `TracingObserver` implementation that logs using the
//! `tracing` crate.

use std::error::Error;
use std::time::Duration;

/// Observer trait for retry attempt events
///
/// Implement this trait to receive callbacks during retry execution.
/// This is useful for logging, metrics collection, or debugging.
pub trait RetryObserver: Send + Sync {
    /// Called when an execution is about to start
    ///
    /// # Arguments
    ///
    /// * `attempt` - The execution number (1 on the first try)
    /// * `max_attempts` - The configured retry budget
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// Called when an execution failed with a conflict and will be retried
    ///
    /// # Arguments
    ///
    /// * `attempt` - The retry about to be performed (1-indexed)
    /// * `error` - The error that caused the failure
    /// * `delay` - The backoff delay before the next execution
    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration);

    /// Called when the operation succeeds
    ///
    /// # Arguments
    ///
    /// * `retries` - Number of retries that were needed (0 on first try)
    /// * `total_delay` - Total time spent suspended between attempts
    fn on_success(&self, retries: u32, total_delay: Duration);

    /// Called when the retry budget is exhausted
    ///
    /// # Arguments
    ///
    /// * `attempts` - Total number of retries made
    /// * `final_error` - The error from the final attempt
    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error);

    /// Called when a failure does not classify as retryable
    ///
    /// # Arguments
    ///
    /// * `attempt` - The execution number that produced the failure
    /// * `error` - The non-retryable error
    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        let _ = (attempt, error);
    }

    /// Called when the backoff suspension is cancelled
    ///
    /// # Arguments
    ///
    /// * `attempts` - Number of retries made before interruption
    fn on_interrupted(&self, attempts: u32) {
        let _ = attempts;
    }
}

/// A no-op observer that does nothing
///
/// Use this when you don't need observation but the API requires an observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Error, _delay: Duration) {}

    fn on_success(&self, _retries: u32, _total_delay: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Error) {}
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG
/// - `on_attempt_failed`: WARN
/// - `on_success`: INFO (if retried) or DEBUG (first attempt)
/// - `on_exhausted`: ERROR
/// - `on_non_retryable` / `on_interrupted`: WARN
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the operation being retried (for log context)
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    ///
    /// # Arguments
    ///
    /// * `operation` - A descriptive name for the operation being retried
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            operation = %self.operation,
            attempt = attempt,
            max_attempts = max_attempts,
            "starting attempt"
        );
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "lock conflict detected, will retry"
        );
    }

    fn on_success(&self, retries: u32, total_delay: Duration) {
        if retries > 0 {
            tracing::info!(
                operation = %self.operation,
                retries = retries,
                total_delay_ms = total_delay.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                "succeeded on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            error = %final_error,
            "all retry attempts exhausted"
        );
    }

    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            "failure is not retryable, propagating"
        );
    }

    fn on_interrupted(&self, attempts: u32) {
        tracing::warn!(
            operation = %self.operation,
            attempts = attempts,
            "interrupted while waiting to retry"
        );
    }
}

/// An observer that collects counters about retry attempts
///
/// Useful for testing and lightweight metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    /// Attempt start events
    pub attempt_starts: std::sync::atomic::AtomicU32,
    /// Failed attempt events
    pub failures: std::sync::atomic::AtomicU32,
    /// Success events
    pub successes: std::sync::atomic::AtomicU32,
    /// Exhaustion events
    pub exhaustions: std::sync::atomic::AtomicU32,
    /// Non-retryable rejection events
    pub rejections: std::sync::atomic::AtomicU32,
    /// Interruption events
    pub interruptions: std::sync::atomic::AtomicU32,
    /// Total backoff delay announced across failed attempts, in milliseconds
    pub waited_ms: std::sync::atomic::AtomicU64,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of attempt starts
    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Get the number of failures
    pub fn failures(&self) -> u32 {
        self.failures.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Get the number of successes
    pub fn successes(&self) -> u32 {
        self.successes.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Get the number of exhaustions
    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Get the number of non-retryable rejections
    pub fn rejections(&self) -> u32 {
        self.rejections.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Get the number of interruptions
    pub fn interruptions(&self) -> u32 {
        self.interruptions.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Get the total announced backoff delay in milliseconds
    pub fn waited_ms(&self) -> u64 {
        self.waited_ms.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Error, delay: Duration) {
        self.failures
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.waited_ms.fetch_add(
            delay.as_millis() as u64,
            std::sync::atomic::Ordering::SeqCst,
        );
    }

    fn on_success(&self, _retries: u32, _total_delay: Duration) {
        self.successes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Error) {
        self.exhaustions
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn on_non_retryable(&self, _attempt: u32, _error: &dyn Error) {
        self.rejections
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn on_interrupted(&self, _attempts: u32) {
        self.interruptions
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Implement RetryObserver for Arc<T> where T: RetryObserver
impl<T: RetryObserver + ?Sized> RetryObserver for std::sync::Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        (**self).on_attempt_failed(attempt, error, delay)
    }

    fn on_success(&self, retries: u32, total_delay: Duration) {
        (**self).on_success(retries, total_delay)
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        (**self).on_exhausted(attempts, final_error)
    }

    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        (**self).on_non_retryable(attempt, error)
    }

    fn on_interrupted(&self, attempts: u32) {
        (**self).on_interrupted(attempts)
    }
}

/// Implement RetryObserver for Box<T> where T: RetryObserver
impl<T: RetryObserver + ?Sized> RetryObserver for Box<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        (**self).on_attempt_failed(attempt, error, delay)
    }

    fn on_success(&self, retries: u32, total_delay: Duration) {
        (**self).on_success(retries, total_delay)
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        (**self).on_exhausted(attempts, final_error)
    }

    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        (**self).on_non_retryable(attempt, error)
    }

    fn on_interrupted(&self, attempts: u32) {
        (**self).on_interrupted(attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_noop_observer() {
        let observer = NoOpObserver;
        let error = io::Error::other("test");

        // These should all be no-ops
        observer.on_attempt_start(1, 3);
        observer.on_attempt_failed(1, &error, Duration::from_millis(100));
        observer.on_success(1, Duration::from_millis(500));
        observer.on_exhausted(3, &error);
        observer.on_non_retryable(2, &error);
        observer.on_interrupted(2);
    }

    #[test]
    fn test_stats_observer_counts() {
        let observer = StatsObserver::new();
        let error = io::Error::other("test");

        observer.on_attempt_start(1, 3);
        observer.on_attempt_start(2, 3);
        observer.on_attempt_failed(1, &error, Duration::from_millis(100));
        observer.on_attempt_failed(2, &error, Duration::from_millis(200));
        observer.on_success(2, Duration::from_millis(300));

        assert_eq!(observer.attempt_starts(), 2);
        assert_eq!(observer.failures(), 2);
        assert_eq!(observer.successes(), 1);
        assert_eq!(observer.waited_ms(), 300);
        assert_eq!(observer.exhaustions(), 0);
    }

    #[test]
    fn test_stats_observer_terminal_events() {
        let observer = StatsObserver::new();
        let error = io::Error::other("test");

        observer.on_exhausted(3, &error);
        observer.on_non_retryable(1, &error);
        observer.on_interrupted(2);

        assert_eq!(observer.exhaustions(), 1);
        assert_eq!(observer.rejections(), 1);
        assert_eq!(observer.interruptions(), 1);
    }

    #[test]
    fn test_tracing_observer_creation() {
        let observer = TracingObserver::new("transfer");
        assert_eq!(observer.operation(), "transfer");

        let default_observer = TracingObserver::default();
        assert_eq!(default_observer.operation(), "retry");
    }

    #[test]
    fn test_arc_observer() {
        let observer = std::sync::Arc::new(StatsObserver::new());
        let error = io::Error::other("test");

        observer.on_attempt_start(1, 3);
        observer.on_attempt_failed(1, &error, Duration::from_millis(100));

        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.failures(), 1);
    }
}
