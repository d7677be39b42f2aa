//! Lock store trait: the minimal atomic contract a shared store must honor.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::LockResult;

/// Atomic key-value operations backing the lock layer.
///
/// Mutual exclusion rests entirely on these four operations being atomic at
/// the store. `put_if_absent` establishes the single-holder invariant;
/// `compare_and_delete` / `compare_and_expire` guard release and renewal
/// against a lease that expired and was re-acquired under a different token.
///
/// Implementations must expire records on their own once the TTL lapses
/// (or treat lapsed records as absent, which is equivalent to callers).
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Store `token` under `key` with the given TTL, only if `key` is absent.
    ///
    /// Returns true when the record was created (the caller now holds the
    /// lock), false when a live record already exists.
    async fn put_if_absent(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool>;

    /// Read the current token under `key`, if a live record exists.
    async fn get(&self, key: &str) -> LockResult<Option<String>>;

    /// Delete the record under `key`, only if it still holds `token`.
    ///
    /// Returns true when the record was deleted, false when the token no
    /// longer matches or the record is gone.
    async fn compare_and_delete(&self, key: &str, token: &str) -> LockResult<bool>;

    /// Reset the TTL of the record under `key`, only if it still holds
    /// `token`.
    ///
    /// Returns true when the TTL was reset, false when the token no longer
    /// matches or the record is gone.
    async fn compare_and_expire(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool>;
}
