//! Error types for distributed lock operations.

use thiserror::Error;

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;

/// Errors surfaced by the lock store and manager.
///
/// A lock being held by someone else is not an error (acquisition returns
/// `None`); these variants cover genuine failures talking to the store.
#[derive(Error, Debug)]
pub enum LockError {
    /// Invalid lock key
    #[error("Invalid lock key: {0}")]
    InvalidKey(String),

    /// Backend error (store, network, etc.)
    #[error("Backend error: {0}")]
    BackendError(String),
}

#[cfg(feature = "redis-backend")]
impl From<redis::RedisError> for LockError {
    fn from(err: redis::RedisError) -> Self {
        LockError::BackendError(format!("Redis error: {}", err))
    }
}

/// Terminal outcomes of running an operation under a lock.
///
/// The protected operation's own failure is carried through unchanged in
/// the `Operation` variant; the coordinator never rewraps or retries it.
#[derive(Error, Debug)]
pub enum CoordinationError<E: std::error::Error + 'static> {
    /// The lock was already held and no wait was requested
    #[error("lock unavailable: {key}")]
    LockUnavailable {
        /// The requested lock key
        key: String,
    },

    /// The wait deadline passed without the lock becoming free
    #[error("timed out after {waited_ms}ms waiting for lock: {key}")]
    LockTimeout {
        /// The requested lock key
        key: String,
        /// How long acquisition polled before giving up
        waited_ms: u64,
    },

    /// The lock store itself failed
    #[error("lock store error: {0}")]
    Store(#[from] LockError),

    /// The protected operation failed; its error is propagated unchanged
    ///
    /// The inner error stays on the causal chain so retry classification
    /// can still see a conflict through this wrapper.
    #[error("{0}")]
    Operation(#[source] E),
}

impl<E: std::error::Error + 'static> CoordinationError<E> {
    /// Check if acquisition failed (immediately or after the wait deadline)
    pub fn is_lock_failure(&self) -> bool {
        matches!(
            self,
            CoordinationError::LockUnavailable { .. } | CoordinationError::LockTimeout { .. }
        )
    }

    /// Get the protected operation's error, consuming this error
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            CoordinationError::Operation(err) => Some(err),
            _ => None,
        }
    }
}
