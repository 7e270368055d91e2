//! Storage abstraction for attempt tracking state.
//!
//! The service keeps no in-process copy of any counter; the store is the
//! single source of truth and every decision re-reads it. Any TTL-capable
//! key-value store with an atomic increment can back the service.

use async_trait::async_trait;

use crate::error::StoreError;

pub mod memory;

pub use memory::MemoryStore;

/// A TTL-capable key-value store used to persist attempt state.
///
/// Implementations must support concurrent in-flight calls and should fail
/// fast when the backend is unreachable; the service propagates store errors
/// rather than guessing at attempt state.
#[async_trait]
pub trait AttemptStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set `key` to `value`, expiring after `ttl_seconds`.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError>;

    /// Atomically increment the integer at `key`, creating it at zero first.
    /// Returns the post-increment value.
    async fn incr(&self, key: &str) -> Result<u64, StoreError>;

    /// Update the TTL of an existing key. Returns `false` when the key does
    /// not exist.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, StoreError>;

    /// Delete the given keys, returning how many existed. Deleting absent
    /// keys is a no-op.
    async fn del(&self, keys: &[&str]) -> Result<u64, StoreError>;

    /// Write `set_key` and refresh the TTL on `expire_key`, batched into a
    /// single round trip where the backend supports it.
    async fn set_and_expire(
        &self,
        set_key: &str,
        value: &str,
        set_ttl_seconds: u64,
        expire_key: &str,
        expire_ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        self.set(set_key, value, set_ttl_seconds).await?;
        self.expire(expire_key, expire_ttl_seconds).await?;
        Ok(())
    }
}
