//! Redis-backed attempt store for the guardrail protection service.
//!
//! Uses a multiplexed [`ConnectionManager`] for connection pooling and an
//! atomic `MULTI`/`EXEC` pipeline for the compound lockout write, so the
//! lockout record and the counter TTL refresh land in one round trip.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use guardrail_core::{BruteForceProtectionService, LockoutConfig};
//! use guardrail_store_redis::RedisAttemptStore;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisAttemptStore::connect("redis://127.0.0.1:6379").await?;
//! let service = BruteForceProtectionService::new(Arc::new(store), LockoutConfig::strict());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use guardrail_core::{AttemptStore, StoreError};

/// Redis implementation of [`AttemptStore`].
///
/// Cloning is cheap; all clones share the underlying multiplexed connection.
/// Calls fail fast when the server is unreachable — the service treats that
/// as a hard error rather than assuming "not blocked".
#[derive(Clone)]
pub struct RedisAttemptStore {
    conn: ConnectionManager,
}

impl RedisAttemptStore {
    /// Connect to a Redis server by URL (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url).map_err(|e| {
            StoreError::Connection(format!("Failed to create Redis client: {e}"))
        })?;
        Self::from_client(client).await
    }

    /// Build a store from an existing [`Client`], sharing its configuration.
    pub async fn from_client(client: Client) -> Result<Self, StoreError> {
        let conn = ConnectionManager::new(client).await.map_err(|e| {
            StoreError::Connection(format!("Failed to create Redis connection manager: {e}"))
        })?;
        tracing::debug!("Connected Redis attempt store");
        Ok(Self { conn })
    }
}

fn backend_error(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl AttemptStore for RedisAttemptStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(backend_error)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, value, ttl_seconds)
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let count: u64 = conn.incr(key, 1).await.map_err(backend_error)?;
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let updated: bool = conn
            .expire(key, ttl_seconds as i64)
            .await
            .map_err(backend_error)?;
        Ok(updated)
    }

    async fn del(&self, keys: &[&str]) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(keys.to_vec()).await.map_err(backend_error)?;
        Ok(removed)
    }

    async fn set_and_expire(
        &self,
        set_key: &str,
        value: &str,
        set_ttl_seconds: u64,
        expire_key: &str,
        expire_ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        // MULTI/EXEC: both writes land together or not at all rather than
        // leaving a lockout record behind with an unrefreshed counter.
        let _: () = redis::pipe()
            .atomic()
            .set_ex(set_key, value, set_ttl_seconds)
            .ignore()
            .expire(expire_key, expire_ttl_seconds as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}
