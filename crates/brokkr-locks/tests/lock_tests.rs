//! Integration tests for lock acquisition, release, and renewal
//! against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use brokkr_core::types::LockSettings;
use brokkr_locks::{LockManager, MemoryLockStore};

const LEASE: Duration = Duration::from_secs(30);

fn manager_over(store: &MemoryLockStore) -> LockManager {
    LockManager::new(Arc::new(store.clone()))
}

fn fast_poll_settings() -> LockSettings {
    LockSettings {
        poll_interval_ms: 10,
        ..LockSettings::default()
    }
}

#[tokio::test]
async fn test_acquire_is_exclusive() {
    let store = MemoryLockStore::new();
    let manager = manager_over(&store);

    let first = manager.acquire("account:1", LEASE).await.unwrap();
    assert!(first.is_some());

    // Same key is busy; a held lock is None, not an error
    let second = manager.acquire("account:1", LEASE).await.unwrap();
    assert!(second.is_none());

    // A different key is independent
    let other = manager.acquire("account:2", LEASE).await.unwrap();
    assert!(other.is_some());
}

#[tokio::test]
async fn test_empty_key_is_rejected() {
    let store = MemoryLockStore::new();
    let manager = manager_over(&store);

    let result = manager.acquire("", LEASE).await;
    assert!(matches!(
        result,
        Err(brokkr_locks::LockError::InvalidKey(_))
    ));
}

#[tokio::test]
async fn test_keys_are_namespaced() {
    let store = MemoryLockStore::new();
    let manager = manager_over(&store);

    let handle = manager.acquire("account:1", LEASE).await.unwrap().unwrap();
    assert_eq!(handle.key(), "lock:account:1");
}

#[tokio::test]
async fn test_release_frees_the_key() {
    let store = MemoryLockStore::new();
    let manager = manager_over(&store);

    let handle = manager.acquire("account:1", LEASE).await.unwrap().unwrap();
    assert!(handle.is_valid());
    assert!(handle.release().await.unwrap());
    assert!(!handle.is_valid());

    assert!(manager.acquire("account:1", LEASE).await.unwrap().is_some());
}

#[tokio::test]
async fn test_release_is_idempotent() {
    let store = MemoryLockStore::new();
    let manager = manager_over(&store);

    let handle = manager.acquire("account:1", LEASE).await.unwrap().unwrap();
    assert!(handle.release().await.unwrap());
    // Second release is safe and reports false
    assert!(!handle.release().await.unwrap());
}

#[tokio::test]
async fn test_release_fails_when_token_was_replaced() {
    let store = MemoryLockStore::new();
    let manager = manager_over(&store);

    let handle = manager.acquire("account:1", LEASE).await.unwrap().unwrap();

    // Simulate lease expiry plus re-acquisition by another process
    store.overwrite(handle.key(), "someone-elses-token", LEASE);

    assert!(!handle.release().await.unwrap());
    assert!(!handle.is_valid());

    // The usurper's record is untouched
    assert_eq!(store.live_records(), 1);
}

#[tokio::test]
async fn test_renew_extends_only_while_owned() {
    let store = MemoryLockStore::new();
    let manager = manager_over(&store);

    let handle = manager.acquire("account:1", LEASE).await.unwrap().unwrap();
    assert!(handle.renew().await.unwrap());
    assert!(handle.is_valid());

    store.overwrite(handle.key(), "someone-elses-token", LEASE);

    assert!(!handle.renew().await.unwrap());
    assert!(!handle.is_valid());
    // An invalid handle refuses further renewals outright
    assert!(!handle.renew().await.unwrap());
}

#[tokio::test]
async fn test_racing_acquirers_exactly_one_wins() {
    let store = MemoryLockStore::new();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let manager = manager_over(&store);
        tasks.push(tokio::spawn(async move {
            manager.acquire("account:1", LEASE).await.unwrap()
        }));
    }

    let results = futures::future::join_all(tasks).await;
    let winners = results
        .into_iter()
        .map(|r| r.unwrap())
        .filter(|h| h.is_some())
        .count();
    assert_eq!(winners, 1);
}

#[tokio::test(start_paused = true)]
async fn test_acquire_with_wait_succeeds_once_released() {
    let store = MemoryLockStore::new();
    let manager =
        LockManager::with_settings(Arc::new(store.clone()), fast_poll_settings());

    let holder = manager.acquire("account:1", LEASE).await.unwrap().unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        holder.release().await.unwrap();
    });

    let handle = manager
        .acquire_with_wait("account:1", Duration::from_millis(500), LEASE)
        .await
        .unwrap();
    assert!(handle.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_acquire_with_wait_times_out() {
    let store = MemoryLockStore::new();
    let manager =
        LockManager::with_settings(Arc::new(store.clone()), fast_poll_settings());

    let _holder = manager.acquire("account:1", LEASE).await.unwrap().unwrap();

    let started = tokio::time::Instant::now();
    let handle = manager
        .acquire_with_wait("account:1", Duration::from_millis(200), LEASE)
        .await
        .unwrap();

    assert!(handle.is_none());
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_waiters_never_overlap_a_holder() {
    let store = MemoryLockStore::new();

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let manager =
            LockManager::with_settings(Arc::new(store.clone()), fast_poll_settings());
        tasks.push(tokio::spawn(async move {
            manager
                .acquire_with_wait("account:1", Duration::from_millis(100), LEASE)
                .await
                .unwrap()
        }));
    }

    let results = futures::future::join_all(tasks).await;
    let handles: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();

    // Nobody released, so at most one waiter can ever have obtained it
    let winners = handles.iter().filter(|h| h.is_some()).count();
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_lease_expiry_reopens_the_key() {
    let store = MemoryLockStore::new();
    let manager = manager_over(&store);

    let stale = manager
        .acquire("account:1", Duration::from_millis(20))
        .await
        .unwrap()
        .unwrap();

    tokio::time::sleep(Duration::from_millis(40)).await;

    // Lease lapsed: a new holder gets in, and the stale handle's release
    // must not touch the new record
    let fresh = manager.acquire("account:1", LEASE).await.unwrap();
    assert!(fresh.is_some());
    assert!(!stale.release().await.unwrap());
}
