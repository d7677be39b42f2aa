//! Retry execution engine
//!
//! This module provides the core retry execution loop with configurable
//! policy, predicate, observer, and cancellation.

use std::error::Error;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::types::BackoffPolicy;

use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver};
use super::strategies::{ConflictPredicate, RetryPredicate};

/// Execute an async operation with retry logic based on a policy
///
/// This is a convenience function for simple retry scenarios. For more
/// control, use `RetryExecutorBuilder`.
///
/// # Arguments
///
/// * `policy` - The backoff policy to use
/// * `op` - A closure that returns a future representing the operation
///
/// # Returns
///
/// The result of the operation, or a `RetryError` if it failed terminally.
///
/// # Example
///
/// ```rust,no_run
/// use brokkr_core::retry::retry_with_policy;
/// use brokkr_core::types::BackoffPolicy;
///
/// async fn example() {
///     let policy = BackoffPolicy::default();
///
///     let result = retry_with_policy(&policy, || async {
///         // Simulated operation that might fail
///         Ok::<_, std::io::Error>("success")
///     }).await;
/// }
/// ```
pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &BackoffPolicy,
    op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + Send + 'static,
{
    RetryExecutorBuilder::new()
        .with_policy(policy.clone())
        .build()
        .execute(op)
        .await
}

/// Builder for configuring a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use brokkr_core::retry::{RetryExecutorBuilder, TracingObserver};
/// use brokkr_core::types::BackoffPolicy;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(BackoffPolicy::default())
///     .with_observer(TracingObserver::new("transfer"))
///     .build();
/// ```
pub struct RetryExecutorBuilder<P = ConflictPredicate, O = NoOpObserver> {
    policy: BackoffPolicy,
    predicate: P,
    observer: O,
    cancellation: CancellationToken,
}

impl Default for RetryExecutorBuilder<ConflictPredicate, NoOpObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder<ConflictPredicate, NoOpObserver> {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            policy: BackoffPolicy::default(),
            predicate: ConflictPredicate,
            observer: NoOpObserver,
            cancellation: CancellationToken::new(),
        }
    }
}

impl<P, O> RetryExecutorBuilder<P, O> {
    /// Set the backoff policy
    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the retry predicate
    ///
    /// The predicate determines whether an error should be retried.
    pub fn with_predicate<P2>(self, predicate: P2) -> RetryExecutorBuilder<P2, O> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate,
            observer: self.observer,
            cancellation: self.cancellation,
        }
    }

    /// Set the observer
    ///
    /// The observer receives callbacks during retry execution.
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<P, O2> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate: self.predicate,
            observer,
            cancellation: self.cancellation,
        }
    }

    /// Set the cancellation token
    ///
    /// Cancelling the token interrupts an in-progress backoff suspension;
    /// the operation is then not retried further.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Build the executor
    pub fn build(self) -> RetryExecutor<P, O> {
        RetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer: self.observer,
            cancellation: self.cancellation,
        }
    }
}

/// A retry executor with configurable policy, predicate, and observer
///
/// Use `RetryExecutorBuilder` to create an instance.
pub struct RetryExecutor<P, O> {
    policy: BackoffPolicy,
    predicate: P,
    observer: O,
    cancellation: CancellationToken,
}

impl<P, O> RetryExecutor<P, O>
where
    O: RetryObserver,
{
    /// Execute an operation with retry logic
    ///
    /// The retry count starts at 0. On each failure the predicate decides
    /// whether the failure classifies as a conflict: unclassified failures
    /// propagate immediately without consuming an attempt; classified
    /// failures consume an attempt, suspend for the policy's delay, and
    /// loop. Suspension only ever blocks the calling task.
    ///
    /// There is no wall-clock bound beyond `max_attempts x max_delay`;
    /// callers needing an absolute deadline compose their own cancellation.
    pub async fn execute<F, Fut, T, E>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + Send + 'static,
        P: RetryPredicate<E>,
    {
        let mut retries: u32 = 0;
        let mut total_delay = Duration::ZERO;

        loop {
            self.observer
                .on_attempt_start(retries + 1, self.policy.max_attempts);

            match op().await {
                Ok(result) => {
                    self.observer.on_success(retries, total_delay);
                    return Ok(result);
                }
                Err(err) => {
                    // Unclassified failures never consume a retry attempt
                    if !self.predicate.should_retry(&err) {
                        self.observer.on_non_retryable(retries + 1, &err);
                        return Err(RetryError::non_retryable(err));
                    }

                    if retries >= self.policy.max_attempts {
                        self.observer.on_exhausted(retries, &err);
                        return Err(RetryError::exhausted(retries, err, total_delay));
                    }

                    retries += 1;
                    let delay = self.policy.next_delay(retries);

                    self.observer.on_attempt_failed(retries, &err, delay);
                    total_delay += delay;

                    if delay.is_zero() {
                        if self.cancellation.is_cancelled() {
                            self.observer.on_interrupted(retries);
                            return Err(RetryError::interrupted(retries, Some(err)));
                        }
                    } else {
                        tokio::select! {
                            _ = self.cancellation.cancelled() => {
                                self.observer.on_interrupted(retries);
                                return Err(RetryError::interrupted(retries, Some(err)));
                            }
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }
    }
}
