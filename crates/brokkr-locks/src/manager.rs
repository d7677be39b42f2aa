//! Lock acquisition and the token-guarded handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use brokkr_core::types::LockSettings;
use uuid::Uuid;

use crate::error::{LockError, LockResult};
use crate::store::LockStore;

/// Acquires leases in a shared lock store.
///
/// Keys are namespaced with the configured prefix before they reach the
/// store. Acquisition is non-blocking: a held lock yields `None`, never an
/// error. `acquire_with_wait` layers cooperative polling on top; there is
/// no fairness among waiters beyond who polls first.
pub struct LockManager {
    store: Arc<dyn LockStore>,
    settings: LockSettings,
}

impl LockManager {
    /// Create a manager with default settings (`lock:` prefix, 100ms polls).
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self::with_settings(store, LockSettings::default())
    }

    /// Create a manager with explicit settings.
    pub fn with_settings(store: Arc<dyn LockStore>, settings: LockSettings) -> Self {
        Self { store, settings }
    }

    /// The settings this manager was built with.
    pub fn settings(&self) -> &LockSettings {
        &self.settings
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.settings.namespace, key)
    }

    /// Attempt one atomic acquisition of the named lock.
    ///
    /// Returns a handle owning a freshly generated token on success, `None`
    /// when another holder currently owns the key. Never blocks.
    pub async fn acquire(&self, key: &str, lease: Duration) -> LockResult<Option<LockHandle>> {
        if key.is_empty() {
            return Err(LockError::InvalidKey("empty lock key".to_string()));
        }

        let store_key = self.namespaced(key);
        let token = Uuid::new_v4().to_string();

        tracing::debug!(key = %store_key, lease_ms = lease.as_millis() as u64, "attempting lock acquisition");

        if self.store.put_if_absent(&store_key, &token, lease).await? {
            tracing::info!(key = %store_key, "lock acquired");
            Ok(Some(LockHandle {
                store: self.store.clone(),
                key: store_key,
                token,
                lease,
                valid: AtomicBool::new(true),
            }))
        } else {
            tracing::debug!(key = %store_key, "lock held elsewhere");
            Ok(None)
        }
    }

    /// Poll `acquire` until it succeeds or `wait_timeout` elapses.
    ///
    /// Returns `None` on timeout. Waiting is cooperative polling at the
    /// configured interval; the suspension only ever parks the calling task.
    pub async fn acquire_with_wait(
        &self,
        key: &str,
        wait_timeout: Duration,
        lease: Duration,
    ) -> LockResult<Option<LockHandle>> {
        let deadline = tokio::time::Instant::now() + wait_timeout;

        while tokio::time::Instant::now() < deadline {
            if let Some(handle) = self.acquire(key, lease).await? {
                return Ok(Some(handle));
            }
            tokio::time::sleep(self.settings.poll_interval()).await;
        }

        tracing::warn!(
            key = %self.namespaced(key),
            waited_ms = wait_timeout.as_millis() as u64,
            "timed out waiting for lock"
        );
        Ok(None)
    }
}

/// Exclusive handle to one acquired lease.
///
/// The handle owns the acquisition token; release and renewal succeed only
/// while the store still maps the key to that token. After a release (even
/// an unsuccessful one) or a failed renewal the handle is permanently
/// invalid. Handles are not shared across callers.
pub struct LockHandle {
    store: Arc<dyn LockStore>,
    key: String,
    token: String,
    lease: Duration,
    valid: AtomicBool,
}

impl LockHandle {
    /// The namespaced key this handle holds.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The lease duration this handle was acquired with.
    pub fn lease(&self) -> Duration {
        self.lease
    }

    /// Whether this handle still believes it owns the lease.
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    /// Release the lease.
    ///
    /// Deletes the record only if it still holds this handle's token,
    /// guarding against deleting a lock that expired and was re-acquired by
    /// someone else. Returns false (and logs the conflict) in that case.
    /// Idempotent: a second call returns false without touching the store.
    pub async fn release(&self) -> LockResult<bool> {
        if !self.valid.swap(false, Ordering::SeqCst) {
            tracing::debug!(key = %self.key, "lock already released");
            return Ok(false);
        }

        let deleted = self.store.compare_and_delete(&self.key, &self.token).await?;
        if deleted {
            tracing::debug!(key = %self.key, "lock released");
        } else {
            tracing::warn!(
                key = %self.key,
                "release conflict: stored token differs, lease expired and was re-acquired"
            );
        }
        Ok(deleted)
    }

    /// Extend the lease back to its full duration.
    ///
    /// Same token guard as `release`. A failed renewal means the lease is
    /// no longer this handle's; the handle becomes invalid.
    pub async fn renew(&self) -> LockResult<bool> {
        if !self.valid.load(Ordering::SeqCst) {
            return Ok(false);
        }

        let extended = self
            .store
            .compare_and_expire(&self.key, &self.token, self.lease)
            .await?;
        if extended {
            tracing::debug!(key = %self.key, "lease renewed");
        } else {
            self.valid.store(false, Ordering::SeqCst);
            tracing::warn!(
                key = %self.key,
                "renew conflict: stored token differs, lease expired and was re-acquired"
            );
        }
        Ok(extended)
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if self.valid.load(Ordering::Relaxed) {
            tracing::warn!(
                key = %self.key,
                "lock handle dropped without release, lease will lapse on its own"
            );
        }
    }
}

impl std::fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockHandle")
            .field("key", &self.key)
            .field("lease", &self.lease)
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}
