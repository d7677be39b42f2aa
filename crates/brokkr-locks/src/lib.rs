//! # brokkr-locks
//!
//! Store-backed distributed locks for coordinating exclusive access to a
//! shared resource across independent server processes.
//!
//! ## Design
//!
//! A lock is a single record in a shared key-value store: the key is the
//! namespaced lock name, the value an opaque ownership token unique to one
//! acquisition, and the TTL the lease duration. Mutual exclusion rests on
//! the store's atomic set-if-absent; release and renewal compare the token
//! first so a holder whose lease already expired (and was re-acquired by
//! someone else) can never delete or extend the new holder's record. The
//! compare happens inside the store's own atomic primitive, never as a
//! separate read followed by a write.
//!
//! A lease that lapses before the work finishes is accepted rather than
//! prevented: the holder's next release or renew fails, and the holder must
//! treat further effects on shared state as suspect. Keep leases long
//! enough, or renew mid-operation.
//!
//! ## Backends
//!
//! - **Memory**: single-process `HashMap` store (feature: `memory-backend`,
//!   default) for tests and embedded use
//! - **Redis**: SET NX PX plus Lua compare-and-delete / compare-and-expire
//!   (feature: `redis-backend`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use brokkr_locks::{LockCoordinator, LockManager, MemoryLockStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = LockManager::new(Arc::new(MemoryLockStore::new()));
//!
//! // Scoped: acquire, run, always release
//! let coordinator = LockCoordinator::new(manager);
//! let balance = coordinator
//!     .run_under_lock("account:42", Duration::from_secs(30), || async {
//!         Ok::<_, std::io::Error>(100)
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod error;
pub mod manager;
pub mod store;

#[cfg(feature = "memory-backend")]
pub mod memory;

#[cfg(feature = "redis-backend")]
pub mod redis;

pub use coordinator::LockCoordinator;
pub use error::{CoordinationError, LockError, LockResult};
pub use manager::{LockHandle, LockManager};
pub use store::LockStore;

#[cfg(feature = "memory-backend")]
pub use memory::MemoryLockStore;

#[cfg(feature = "redis-backend")]
pub use redis::RedisLockStore;
