//! TTL-aware in-memory attempt store.
//!
//! Backed by [`DashMap`] with lazy expiry on access. Suitable for tests and
//! single-process deployments; multi-instance deployments need a shared
//! backend so that every instance observes the same counters.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use super::AttemptStore;
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory [`AttemptStore`] implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn purge_expired(&self, key: &str, now: DateTime<Utc>) {
        self.entries.remove_if(key, |_, entry| entry.expired(now));
    }
}

fn expiry(ttl_seconds: u64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(ttl_seconds.min(i64::MAX as u64) as i64)
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.purge_expired(key, Utc::now());
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(expiry(ttl_seconds)),
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        let now = Utc::now();
        // The entry guard holds the shard lock, making the whole
        // read-modify-write atomic with respect to other callers.
        let mut entry = self.entries.entry(key.to_string()).or_insert(Entry {
            value: "0".to_string(),
            expires_at: None,
        });
        if entry.expired(now) {
            entry.value = "0".to_string();
            entry.expires_at = None;
        }
        let count = entry
            .value
            .parse::<u64>()
            .map_err(|_| StoreError::Serialization {
                key: key.to_string(),
                message: "counter is not an integer".to_string(),
            })?
            .saturating_add(1);
        entry.value = count.to_string();
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, StoreError> {
        let now = Utc::now();
        self.purge_expired(key, now);
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = Some(expiry(ttl_seconds));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn del(&self, keys: &[&str]) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut removed = 0;
        for key in keys {
            if let Some((_, entry)) = self.entries.remove(*key) {
                if !entry.expired(now) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}
