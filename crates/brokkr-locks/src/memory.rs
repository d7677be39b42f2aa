//! In-memory lock store implementation (for testing and embedded use).

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::LockResult;
use crate::store::LockStore;

#[derive(Debug, Clone)]
struct Entry {
    token: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory lock store.
///
/// All four store operations run inside one mutex-guarded critical section,
/// which makes them atomic with respect to each other. Expired entries are
/// treated as absent and removed lazily on access.
///
/// ## Limitations
/// - Not persistent (locks lost on restart)
/// - Not distributed (single process only)
#[derive(Clone, Default)]
pub struct MemoryLockStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryLockStore {
    /// Create a new in-memory lock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the record under `key` regardless of what it holds.
    ///
    /// Test support: simulates a lease that expired and was re-acquired by
    /// a different holder between two of the original holder's calls.
    pub fn overwrite(&self, key: &str, token: &str, ttl: Duration) {
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                token: token.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Number of live (unexpired) records.
    pub fn live_records(&self) -> usize {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired());
        entries.len()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn put_if_absent(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(existing) if !existing.is_expired() => Ok(false),
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        token: token.to_string(),
                        expires_at: Instant::now() + ttl,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str) -> LockResult<Option<String>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(existing) if !existing.is_expired() => Ok(Some(existing.token.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn compare_and_delete(&self, key: &str, token: &str) -> LockResult<bool> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(existing) if !existing.is_expired() && existing.token == token => {
                entries.remove(key);
                Ok(true)
            }
            Some(existing) if existing.is_expired() => {
                entries.remove(key);
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    async fn compare_and_expire(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(existing) if !existing.is_expired() && existing.token == token => {
                existing.expires_at = Instant::now() + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
