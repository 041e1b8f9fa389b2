// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared tier backed by Redis.

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use tick::Clock;
use tokencache_tier::{CacheBackend, CacheBlob, CacheHints, Error, ExpiryPolicy, PartitionKey, Result};

/// A shared token-cache tier stored in Redis.
///
/// Each partition is a Redis string written with `SET .. PX`, so Redis evicts it when
/// its lifetime, computed by the [`ExpiryPolicy`], has elapsed. Connection failures and
/// timeouts are reported as retryable errors; other failures carry unknown recovery.
///
/// # Examples
///
/// ```no_run
/// use tick::Clock;
/// use tokencache::{RedisBackend, TokenCacheOptions, TokenCacheProviderBuilder};
///
/// # async fn example(clock: Clock) -> Result<(), Box<dyn std::error::Error>> {
/// let options = TokenCacheOptions::default();
/// let shared = RedisBackend::connect("redis://127.0.0.1/", options.expiry_policy(), clock.clone()).await?;
/// let provider = TokenCacheProviderBuilder::new(clock).options(options).distributed(shared)?;
/// # let _ = provider;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
    expiry: ExpiryPolicy,
    clock: Clock,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Connects to the Redis server at `url`.
    ///
    /// The connection is re-established automatically after it drops.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server cannot be reached.
    pub async fn connect(url: &str, expiry: ExpiryPolicy, clock: Clock) -> Result<Self> {
        let client = Client::open(url).map_err(classify)?;
        let connection = ConnectionManager::new(client).await.map_err(classify)?;
        Ok(Self::from_connection(connection, expiry, clock))
    }

    /// Wraps an existing connection manager.
    #[must_use]
    pub fn from_connection(connection: ConnectionManager, expiry: ExpiryPolicy, clock: Clock) -> Self {
        Self { connection, expiry, clock }
    }
}

impl CacheBackend for RedisBackend {
    async fn get(&self, key: &PartitionKey, _hints: &mut CacheHints) -> Result<Option<CacheBlob>> {
        let mut connection = self.connection.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key.as_str())
            .query_async(&mut connection)
            .await
            .map_err(classify)?;
        Ok(value.map(CacheBlob::from))
    }

    async fn set(&self, key: &PartitionKey, blob: CacheBlob, hints: &CacheHints) -> Result<()> {
        let ttl = self.expiry.effective_ttl(hints, self.clock.system_time());
        let mut connection = self.connection.clone();
        let _: redis::Value = redis::cmd("SET")
            .arg(key.as_str())
            .arg(blob.as_ref())
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut connection)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete(&self, key: &PartitionKey) -> Result<()> {
        let mut connection = self.connection.clone();
        let _: redis::Value = redis::cmd("DEL")
            .arg(key.as_str())
            .query_async(&mut connection)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn classify(error: RedisError) -> Error {
    if error.is_timeout() || error.is_connection_dropped() || error.is_connection_refusal() || error.is_io_error() {
        Error::transient(error)
    } else {
        Error::from_message(error)
    }
}
