//! The typed, fail-open cache facade.
//!
//! `ByteCache` is the only cache type the application layer touches. It
//! serializes payloads as JSON at a typed boundary, bounds every backend
//! call with the operation timeout, and exposes errors as `CacheError`
//! values for the orchestrator to absorb; without a configured backend every
//! operation degrades to its miss/no-op form.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::backend::{CacheBackend, CacheError};
use super::config::CacheConfig;
use super::redis::RedisBackend;

pub struct ByteCache {
    backend: Option<Arc<dyn CacheBackend>>,
    operation_timeout: Duration,
}

impl ByteCache {
    /// A cache with no backend: always miss, writes are no-ops.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            operation_timeout: Duration::ZERO,
        }
    }

    pub fn with_backend(backend: Arc<dyn CacheBackend>, operation_timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            operation_timeout,
        }
    }

    /// Build from configuration: a Redis backend when a URL is set,
    /// otherwise disabled. An invalid URL also degrades to disabled since
    /// the cache must never block startup.
    pub fn from_config(config: &CacheConfig) -> Self {
        match config.url.as_deref() {
            Some(url) => match RedisBackend::new(url, config.connect_timeout) {
                Ok(backend) => Self::with_backend(Arc::new(backend), config.operation_timeout),
                Err(err) => {
                    tracing::warn!(
                        target = "vetrina::cache",
                        error = %err,
                        "invalid cache url, running without cache"
                    );
                    Self::disabled()
                }
            },
            None => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        if self.operation_timeout.is_zero() {
            return fut.await;
        }
        tokio::time::timeout(self.operation_timeout, fut)
            .await
            .map_err(|_| CacheError::Timeout)?
    }

    /// Fetch and deserialize; `Ok(None)` on miss or when disabled.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(backend) = self.backend.as_ref() else {
            return Ok(None);
        };
        let raw = self.bounded(backend.get(key)).await?;
        match raw {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store with the given TTL; no-op when disabled.
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let Some(backend) = self.backend.as_ref() else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(value)?;
        self.bounded(backend.set(key, &bytes, ttl)).await
    }

    /// Delete every key under `prefix`; no-op when disabled.
    pub async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let Some(backend) = self.backend.as_ref() else {
            return Ok(0);
        };
        self.bounded(backend.delete_by_prefix(prefix)).await
    }
}
