//! Vetrina cache system.
//!
//! A fail-open byte-cache fronting the blog endpoints:
//!
//! - **`ByteCache`**: typed get/set/delete-by-prefix facade; every failure
//!   degrades to a miss or no-op so the cache can never change functional
//!   behavior, only latency.
//! - **`CacheBackend`**: the storage contract. `RedisBackend` is the
//!   production implementation (lazy connection, TTL via SETEX, SCAN-based
//!   prefix deletion); `MemoryBackend` serves tests and single-node setups.
//! - **`CacheKeys`**: deterministic key construction with optional hashed
//!   caller-identity segmentation.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! url = "redis://127.0.0.1:6379"
//! key_prefix = "vetrina"
//! anon_ttl_seconds = 60
//! identity_ttl_seconds = 300
//! # ... see config.rs for all options
//! ```

mod backend;
mod config;
mod keys;
mod lock;
mod redis;
mod store;

pub use self::backend::{CacheBackend, CacheError, MemoryBackend};
pub use self::config::CacheConfig;
pub use self::keys::{CacheKeys, IdentityHint};
pub use self::redis::RedisBackend;
pub use self::store::ByteCache;
