//! Retry execution engine with policy-based backoff
//!
//! This module absorbs transient lock-conflict failures by re-executing an
//! operation under a configurable backoff policy. Failures that do not
//! classify as contention are propagated immediately.
//!
//! # Features
//!
//! - Three backoff strategies: fixed delay, randomized backoff with jitter,
//!   exponential backoff with cap
//! - Conflict classification over error kinds, messages, and causal chains
//! - Observable retry attempts via the `RetryObserver` trait
//! - Built-in `TracingObserver` for logging
//! - Cancellable backoff suspension via `CancellationToken`
//! - Builder pattern for flexible executor configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use brokkr_core::retry::{retry_with_policy, RetryError};
//! use brokkr_core::types::BackoffPolicy;
//!
//! async fn example() -> Result<String, RetryError<std::io::Error>> {
//!     let policy = BackoffPolicy::default();
//!
//!     retry_with_policy(&policy, || async {
//!         // Your fallible operation here
//!         Ok("success".to_string())
//!     }).await
//! }
//! ```

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::{retry_with_policy, RetryExecutor, RetryExecutorBuilder};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use strategies::{
    is_lock_conflict, next_delay, ClosurePredicate, ConflictPredicate, LockConflict,
    RetryPredicate,
};
