//! Cache backend contract and the in-memory implementation.
//!
//! The backend stores opaque bytes under string keys with per-entry TTL
//! expiry and exact-prefix bulk deletion. `RedisBackend` (redis.rs) is the
//! production implementation; `MemoryBackend` backs tests and single-node
//! deployments where an external cache is not worth running.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::backend";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache operation timed out")]
    Timeout,
    #[error("cache payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Byte-level cache storage.
///
/// Implementations must be safe for concurrent use and honor TTL expiry: a
/// read after expiry behaves identically to a never-set key.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a value; `None` on absence or expiry.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a value with the given TTL, overwriting any existing entry.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Delete every key whose name starts with `prefix` (exact prefix match,
    /// not substring). Returns the number of deleted keys.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError>;
}

struct Entry {
    payload: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-process TTL cache keyed by string.
///
/// Expired entries are dropped lazily on access and swept opportunistically
/// on writes; there is no size bound because list pages and single posts are
/// the only tenants.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        {
            let entries = rw_read(&self.entries, SOURCE, "get");
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.payload.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired: upgrade to a write lock and drop the entry.
        rw_write(&self.entries, SOURCE, "get.expire").remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "set");
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(
            key.to_string(),
            Entry {
                payload: value.to_vec(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut entries = rw_write(&self.entries, SOURCE, "delete_by_prefix");
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}
