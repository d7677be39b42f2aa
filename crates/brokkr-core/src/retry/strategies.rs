//! Backoff delay strategies and conflict classification
//!
//! This module implements the backoff delay formulas and provides the
//! predicates that decide whether a failure should be retried.

use crate::types::{BackoffPolicy, BackoffStrategy};
use rand::Rng;
use std::error::Error;
use std::time::Duration;

/// Message fragments that indicate a lock conflict in the underlying store.
///
/// Matched case-insensitively against every error in the causal chain.
const CONFLICT_PATTERNS: &[&str] = &[
    "ora-00054",
    "timeout trying to lock table",
    "lock timeout",
    "lock wait timeout",
    "database is locked",
    "deadlock",
    "busy",
];

/// Calculate the delay before the next retry attempt
///
/// # Arguments
///
/// * `policy` - The backoff policy containing strategy and timing parameters
/// * `attempt` - The retry count after incrementing (first retry is 1)
///
/// # Returns
///
/// The duration to wait before the next retry attempt, never exceeding
/// `max_delay_ms`.
///
/// # Example
///
/// ```rust
/// use brokkr_core::retry::next_delay;
/// use brokkr_core::types::{BackoffPolicy, BackoffStrategy};
///
/// let policy = BackoffPolicy {
///     max_attempts: 10,
///     strategy: BackoffStrategy::ExponentialBackoff,
///     backoff_multiplier: 2.0,
///     base_delay_ms: 100,
///     max_delay_ms: 2000,
///     step_increment_ms: 50,
///     jitter_bound_ms: 200,
/// };
///
/// assert_eq!(next_delay(&policy, 1).as_millis(), 200);
/// assert_eq!(next_delay(&policy, 2).as_millis(), 400);
/// ```
pub fn next_delay(policy: &BackoffPolicy, attempt: u32) -> Duration {
    let delay_ms = match policy.strategy {
        BackoffStrategy::FixedDelay => policy.base_delay_ms,

        BackoffStrategy::RandomBackoff => {
            let stepped = policy.base_delay_ms + attempt as u64 * policy.step_increment_ms;
            let jitter = rand::rng().random_range(0..=policy.jitter_bound_ms);
            stepped + jitter
        }

        BackoffStrategy::ExponentialBackoff => {
            let multiplied = policy.base_delay_ms as f64 * policy.backoff_multiplier.powi(attempt as i32);
            multiplied as u64
        }
    };

    Duration::from_millis(delay_ms.min(policy.max_delay_ms))
}

impl BackoffPolicy {
    /// Delay before the given retry attempt (first retry is 1).
    pub fn next_delay(&self, attempt: u32) -> Duration {
        next_delay(self, attempt)
    }

    /// Whether a failure should be retried at the given retry count.
    ///
    /// True iff the retry budget is not yet spent and the failure (or any
    /// failure in its causal chain) classifies as a lock conflict.
    pub fn should_retry<E: Error + 'static>(&self, error: &E, attempt: u32) -> bool {
        attempt < self.max_attempts && is_lock_conflict(error)
    }
}

/// Classify a failure as a lock conflict
///
/// Walks the error and its entire `source()` chain. A failure is a conflict
/// iff any link is the dedicated [`LockConflict`] kind, a timeout-style IO
/// error, or carries a message matching a known database lock-conflict
/// signature. Anything else is never retried.
pub fn is_lock_conflict<E: Error + 'static>(error: &E) -> bool {
    let mut current: Option<&(dyn Error + 'static)> = Some(error);
    while let Some(err) = current {
        if err.is::<LockConflict>() {
            return true;
        }
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            if matches!(
                io_err.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ) {
                return true;
            }
        }
        let message = err.to_string().to_lowercase();
        if CONFLICT_PATTERNS.iter().any(|p| message.contains(p)) {
            return true;
        }
        current = err.source();
    }
    false
}

/// Dedicated failure kind signalling contention on a shared resource
///
/// Protected operations can return (or wrap as a source) this error to mark
/// a failure as retryable without relying on message matching.
#[derive(Debug, Clone, thiserror::Error)]
#[error("lock conflict on resource: {resource}")]
pub struct LockConflict {
    /// The contended resource
    pub resource: String,
}

impl LockConflict {
    /// Create a new lock conflict for the given resource
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
        }
    }
}

/// A predicate that determines whether an error should be retried
///
/// The executor consults its predicate before consuming a retry attempt.
/// The default is [`ConflictPredicate`]; implement this trait (or use
/// [`ClosurePredicate`]) to customize which errors count as transient.
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    /// Determine whether the given error should be retried
    fn should_retry(&self, error: &E) -> bool;
}

/// The default predicate: retry only classified lock conflicts
///
/// Delegates to [`is_lock_conflict`], so the dedicated conflict kind,
/// timeout-style IO errors, and known store conflict messages are retryable
/// anywhere in the causal chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictPredicate;

impl<E: Error + 'static> RetryPredicate<E> for ConflictPredicate {
    fn should_retry(&self, error: &E) -> bool {
        is_lock_conflict(error)
    }
}

/// A predicate that uses a closure to determine retryability
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    /// Create a new closure-based predicate
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn policy(strategy: BackoffStrategy) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: 10,
            strategy,
            backoff_multiplier: 2.0,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            step_increment_ms: 50,
            jitter_bound_ms: 200,
        }
    }

    #[test]
    fn test_fixed_strategy_constant() {
        let policy = policy(BackoffStrategy::FixedDelay);

        for attempt in 1..=10 {
            assert_eq!(next_delay(&policy, attempt), Duration::from_millis(100));
        }
    }

    #[test]
    fn test_exponential_strategy_doubles() {
        let policy = policy(BackoffStrategy::ExponentialBackoff);

        // attempt 1: 100 * 2^1 = 200
        assert_eq!(next_delay(&policy, 1), Duration::from_millis(200));
        // attempt 2: 100 * 2^2 = 400
        assert_eq!(next_delay(&policy, 2), Duration::from_millis(400));
        // attempt 3: 100 * 2^3 = 800
        assert_eq!(next_delay(&policy, 3), Duration::from_millis(800));
        // attempt 4: 100 * 2^4 = 1600
        assert_eq!(next_delay(&policy, 4), Duration::from_millis(1600));
    }

    #[test]
    fn test_exponential_non_decreasing_and_capped() {
        let policy = policy(BackoffStrategy::ExponentialBackoff);

        let mut previous = Duration::ZERO;
        for attempt in 1..=20 {
            let delay = next_delay(&policy, attempt);
            assert!(delay >= previous, "delay shrank at attempt {}", attempt);
            assert!(delay <= Duration::from_millis(2000));
            previous = delay;
        }
        // attempt 5: 100 * 2^5 = 3200, capped at 2000
        assert_eq!(next_delay(&policy, 5), Duration::from_millis(2000));
    }

    #[test]
    fn test_random_strategy_bounds() {
        let policy = policy(BackoffStrategy::RandomBackoff);

        for attempt in 1..=5u32 {
            let floor = 100 + attempt as u64 * 50;
            for _ in 0..100 {
                let delay = next_delay(&policy, attempt).as_millis() as u64;
                assert!(delay >= floor.min(2000));
                assert!(delay <= (floor + 200).min(2000));
            }
        }
    }

    #[test]
    fn test_random_strategy_respects_cap() {
        let policy = BackoffPolicy {
            max_delay_ms: 120,
            ..policy(BackoffStrategy::RandomBackoff)
        };

        for _ in 0..100 {
            assert!(next_delay(&policy, 5) <= Duration::from_millis(120));
        }
    }

    #[test]
    fn test_should_retry_stops_at_max_attempts() {
        let policy = BackoffPolicy {
            max_attempts: 3,
            ..policy(BackoffStrategy::FixedDelay)
        };
        let conflict = LockConflict::new("acct-1");

        assert!(policy.should_retry(&conflict, 0));
        assert!(policy.should_retry(&conflict, 2));
        assert!(!policy.should_retry(&conflict, 3));
        assert!(!policy.should_retry(&conflict, 4));
    }

    #[test]
    fn test_should_retry_rejects_unclassified() {
        let policy = policy(BackoffStrategy::FixedDelay);
        let err = io::Error::new(io::ErrorKind::NotFound, "row not found");

        assert!(!policy.should_retry(&err, 0));
    }

    #[test]
    fn test_conflict_kind_is_retryable() {
        assert!(is_lock_conflict(&LockConflict::new("acct-42")));
    }

    #[test]
    fn test_timeout_io_error_is_retryable() {
        assert!(is_lock_conflict(&io::Error::new(
            io::ErrorKind::TimedOut,
            "statement timed out"
        )));
        assert!(!is_lock_conflict(&io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied"
        )));
    }

    #[test]
    fn test_message_signatures_are_retryable() {
        let cases = [
            "ORA-00054: resource busy and acquire with NOWAIT specified",
            "Timeout trying to lock table \"ACCOUNTS\"",
            "Lock wait timeout exceeded; try restarting transaction",
            "database is locked",
            "Deadlock found when trying to get lock",
        ];
        for message in cases {
            let err = io::Error::other(message);
            assert!(is_lock_conflict(&err), "expected conflict for: {message}");
        }

        let err = io::Error::other("duplicate key value violates unique constraint");
        assert!(!is_lock_conflict(&err));
    }

    #[test]
    fn test_conflict_found_through_causal_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("transaction rolled back")]
        struct TxError {
            #[source]
            source: LockConflict,
        }

        let err = TxError {
            source: LockConflict::new("acct-7"),
        };
        assert!(is_lock_conflict(&err));
    }

    #[test]
    fn test_closure_predicate() {
        let predicate = ClosurePredicate::new(|err: &io::Error| {
            matches!(
                err.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
            )
        });

        let timeout_err = io::Error::new(io::ErrorKind::TimedOut, "timeout");
        let not_found_err = io::Error::new(io::ErrorKind::NotFound, "not found");

        assert!(predicate.should_retry(&timeout_err));
        assert!(!predicate.should_retry(&not_found_err));
    }
}
