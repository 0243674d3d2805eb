//! Redis-backed cache storage.
//!
//! One multiplexed connection per process, established lazily on first use
//! under a bounded connect timeout. A failed connect leaves the cell unset,
//! so the next operation retries instead of wedging the process in a
//! permanently-degraded state.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tokio::sync::OnceCell;

use super::backend::{CacheBackend, CacheError};

/// Batch size hint for SCAN during prefix deletion.
const SCAN_COUNT: usize = 100;

pub struct RedisBackend {
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
    connect_timeout: Duration,
}

impl RedisBackend {
    pub fn new(url: &str, connect_timeout: Duration) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|err| CacheError::backend(err.to_string()))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
            connect_timeout,
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                tokio::time::timeout(
                    self.connect_timeout,
                    self.client.get_multiplexed_async_connection(),
                )
                .await
                .map_err(|_| CacheError::Timeout)?
                .map_err(|err| CacheError::backend(err.to_string()))
            })
            .await?;
        Ok(connection.clone())
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut connection = self.connection().await?;
        let value: Option<Vec<u8>> = connection
            .get(key)
            .await
            .map_err(|err| CacheError::backend(err.to_string()))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection().await?;
        // SETEX takes whole seconds; never round a positive TTL down to zero.
        let seconds = ttl.as_secs().max(1);
        let _: () = connection
            .set_ex(key, value, seconds)
            .await
            .map_err(|err| CacheError::backend(err.to_string()))?;
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut connection = self.connection().await?;
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut connection)
                .await
                .map_err(|err| CacheError::backend(err.to_string()))?;

            if !batch.is_empty() {
                let removed: u64 = connection
                    .del(&batch)
                    .await
                    .map_err(|err| CacheError::backend(err.to_string()))?;
                deleted += removed;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(deleted)
    }
}
