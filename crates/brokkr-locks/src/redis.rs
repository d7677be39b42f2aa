//! Redis-based lock store implementation.
//!
//! Acquisition maps to `SET key token NX PX ttl`; release and renewal run
//! as Lua scripts so the token comparison and the delete / expire happen in
//! one atomic step on the server.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LockError, LockResult};
use crate::store::LockStore;

const COMPARE_AND_DELETE: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
else
    return 0
end
"#;

const COMPARE_AND_EXPIRE: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('PEXPIRE', KEYS[1], ARGV[2])
else
    return 0
end
"#;

/// Redis lock store.
///
/// Clones share one multiplexed connection manager, which reconnects on its
/// own after transient network failures.
#[derive(Clone)]
pub struct RedisLockStore {
    conn: ConnectionManager,
    delete_script: Arc<Script>,
    expire_script: Arc<Script>,
}

impl RedisLockStore {
    /// Connect to Redis with the given URL.
    ///
    /// Example URLs:
    /// - `redis://127.0.0.1/`
    /// - `redis+tls://host:6379/`
    pub async fn connect(redis_url: &str) -> LockResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| LockError::BackendError(format!("failed to create redis client: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| LockError::BackendError(format!("failed to connect redis: {e}")))?;
        Ok(Self::with_connection(conn))
    }

    /// Build a store over an existing connection manager.
    pub fn with_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            delete_script: Arc::new(Script::new(COMPARE_AND_DELETE)),
            expire_script: Arc::new(Script::new(COMPARE_AND_EXPIRE)),
        }
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn put_if_absent(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;
        // SET NX returns OK when the key was written, nil when it existed
        Ok(reply.is_some())
    }

    async fn get(&self, key: &str) -> LockResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn compare_and_delete(&self, key: &str, token: &str) -> LockResult<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .delete_script
            .key(key)
            .arg(token)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }

    async fn compare_and_expire(&self, key: &str, token: &str, ttl: Duration) -> LockResult<bool> {
        let mut conn = self.conn.clone();
        let extended: i64 = self
            .expire_script
            .key(key)
            .arg(token)
            .arg(ttl.as_millis() as u64)
            .invoke_async(&mut conn)
            .await?;
        Ok(extended == 1)
    }
}
