//! Lock-scoped execution: acquire, run, always release.

use std::error::Error;
use std::future::Future;
use std::time::Duration;

use crate::error::CoordinationError;
use crate::manager::{LockHandle, LockManager};

/// Runs operations inside an acquire/release bracket.
///
/// Acquisition failure is terminal here: the coordinator never retries it.
/// Retrying the *protected operation* is the retry executor's concern;
/// retrying *acquisition* is a composition the caller makes explicitly.
pub struct LockCoordinator {
    manager: LockManager,
}

impl LockCoordinator {
    /// Create a coordinator over the given manager.
    pub fn new(manager: LockManager) -> Self {
        Self { manager }
    }

    /// The underlying manager.
    pub fn manager(&self) -> &LockManager {
        &self.manager
    }

    /// Acquire the named lock, run `op`, release, propagate `op`'s outcome.
    ///
    /// Fails with `CoordinationError::LockUnavailable` when the lock is
    /// held elsewhere. The release happens on every exit path, including
    /// operation failure, and its outcome never masks the operation's.
    pub async fn run_under_lock<F, Fut, T, E>(
        &self,
        key: &str,
        lease: Duration,
        op: F,
    ) -> Result<T, CoordinationError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        match self.manager.acquire(key, lease).await? {
            Some(handle) => self.run_with_handle(handle, op).await,
            None => Err(CoordinationError::LockUnavailable {
                key: key.to_string(),
            }),
        }
    }

    /// Like `run_under_lock`, but wait up to `wait_timeout` for the lock.
    ///
    /// Fails with `CoordinationError::LockTimeout` when the deadline passes
    /// without the lock becoming free.
    pub async fn run_under_lock_with_wait<F, Fut, T, E>(
        &self,
        key: &str,
        wait_timeout: Duration,
        lease: Duration,
        op: F,
    ) -> Result<T, CoordinationError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        match self
            .manager
            .acquire_with_wait(key, wait_timeout, lease)
            .await?
        {
            Some(handle) => self.run_with_handle(handle, op).await,
            None => Err(CoordinationError::LockTimeout {
                key: key.to_string(),
                waited_ms: wait_timeout.as_millis() as u64,
            }),
        }
    }

    async fn run_with_handle<F, Fut, T, E>(
        &self,
        handle: LockHandle,
        op: F,
    ) -> Result<T, CoordinationError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        tracing::debug!(key = %handle.key(), "lock acquired, running protected operation");

        let outcome = op().await;

        self.release_quietly(&handle).await;

        outcome.map_err(CoordinationError::Operation)
    }

    /// Release without letting a release failure mask the operation outcome.
    async fn release_quietly(&self, handle: &LockHandle) {
        match handle.release().await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(key = %handle.key(), "lock was no longer ours at release time");
            }
            Err(err) => {
                tracing::warn!(key = %handle.key(), error = %err, "failed to release lock");
            }
        }
    }
}
