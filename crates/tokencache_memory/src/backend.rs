// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Memory backend implementation using moka.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use moka::Expiry;
use moka::future::Cache;
use tick::Clock;
use tokencache_tier::{CacheBackend, CacheBlob, CacheHints, CacheLevel, ExpiryPolicy, PartitionKey, Result};

use crate::MemoryBackendBuilder;

// moka computes deadlines on `Instant`, which may overflow for huge durations.
const MAX_BACKGROUND_EXPIRY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct StoredBlob {
    blob: CacheBlob,
    ttl: Duration,
    // `None` when the deadline is not representable.
    expires_at: Option<SystemTime>,
}

impl StoredBlob {
    fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Evicts entries in the background once their lifetime has elapsed in real time.
///
/// Reads check the deadline against the injected clock as well, so an entry is never
/// served past its expiry even when that clock runs ahead of real time.
struct BlobExpiry;

impl Expiry<PartitionKey, StoredBlob> for BlobExpiry {
    fn expire_after_create(&self, _key: &PartitionKey, value: &StoredBlob, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl.min(MAX_BACKGROUND_EXPIRY))
    }

    fn expire_after_update(
        &self,
        _key: &PartitionKey,
        value: &StoredBlob,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl.min(MAX_BACKGROUND_EXPIRY))
    }
}

fn weigh(_key: &PartitionKey, value: &StoredBlob) -> u32 {
    u32::try_from(value.blob.len()).unwrap_or(u32::MAX)
}

/// A process-local token-cache backend.
///
/// - `get` returns a miss once the entry's deadline has passed on the injected clock.
/// - `set` replaces the entry and recomputes its lifetime from the hints.
/// - `delete` of an absent key is a no-op.
///
/// None of the operations fail. Clones share the same storage.
///
/// # Examples
///
/// ```
/// use tick::Clock;
/// use tokencache_memory::MemoryBackend;
/// use tokencache_tier::{CacheBackend, CacheBlob, CacheHints, CacheLevel, PartitionKey};
///
/// # futures::executor::block_on(async {
/// let backend = MemoryBackend::new(Clock::new_frozen());
/// let key = PartitionKey::from("App-clientA");
/// backend.set(&key, CacheBlob::from_static(b"state"), &CacheHints::new()).await?;
///
/// let mut hints = CacheHints::new();
/// assert!(backend.get(&key, &mut hints).await?.is_some());
/// assert_eq!(hints.telemetry().cache_level(), CacheLevel::L1);
/// # Ok::<(), tokencache_tier::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    inner: Cache<PartitionKey, StoredBlob>,
    expiry: ExpiryPolicy,
    clock: Clock,
    name: Option<Arc<str>>,
}

impl MemoryBackend {
    /// Creates an unbounded backend with the default expiry ceiling.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::builder(clock).build()
    }

    /// Creates a builder for configuring a backend.
    #[must_use]
    pub fn builder(clock: Clock) -> MemoryBackendBuilder {
        MemoryBackendBuilder::new(clock)
    }

    pub(crate) fn from_builder(builder: MemoryBackendBuilder) -> Self {
        let mut moka_builder = Cache::builder().weigher(weigh).expire_after(BlobExpiry);

        if let Some(bytes) = builder.size_limit {
            moka_builder = moka_builder.max_capacity(bytes);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
            expiry: builder.expiry,
            clock: builder.clock,
            name: builder.name.map(Arc::from),
        }
    }

    /// Returns the name given to the backend, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the policy used to compute entry lifetimes.
    #[must_use]
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry
    }

    /// Returns the approximate total weight of stored entries, in bytes.
    ///
    /// Like [`len`](CacheBackend::len), the value lags behind recent writes until
    /// [`run_pending_tasks`](Self::run_pending_tasks) is called.
    #[must_use]
    pub fn weighted_size(&self) -> u64 {
        self.inner.weighted_size()
    }

    /// Applies pending evictions and refreshes the size counters.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }
}

impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &PartitionKey, hints: &mut CacheHints) -> Result<Option<CacheBlob>> {
        let Some(stored) = self.inner.get(key).await else {
            return Ok(None);
        };

        if stored.is_expired(self.clock.system_time()) {
            return Ok(None);
        }

        hints.record_served_from(CacheLevel::L1);
        Ok(Some(stored.blob))
    }

    async fn set(&self, key: &PartitionKey, blob: CacheBlob, hints: &CacheHints) -> Result<()> {
        let now = self.clock.system_time();
        let ttl = self.expiry.effective_ttl(hints, now);
        let stored = StoredBlob {
            blob,
            ttl,
            expires_at: now.checked_add(ttl),
        };

        self.inner.insert(key.clone(), stored).await;
        Ok(())
    }

    async fn delete(&self, key: &PartitionKey) -> Result<()> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.inner.entry_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_is_blob_length() {
        let key = PartitionKey::from("App-clientA");
        let stored = StoredBlob {
            blob: CacheBlob::from(vec![0_u8; 500]),
            ttl: Duration::from_secs(1),
            expires_at: None,
        };

        assert_eq!(weigh(&key, &stored), 500);
    }

    #[test]
    fn unrepresentable_deadline_never_expires() {
        let stored = StoredBlob {
            blob: CacheBlob::new(),
            ttl: Duration::MAX,
            expires_at: None,
        };

        assert!(!stored.is_expired(SystemTime::now()));
    }

    #[test]
    fn deadline_is_inclusive() {
        let deadline = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let stored = StoredBlob {
            blob: CacheBlob::new(),
            ttl: Duration::from_secs(10),
            expires_at: Some(deadline),
        };

        assert!(!stored.is_expired(deadline - Duration::from_millis(1)));
        assert!(stored.is_expired(deadline));
    }

    #[test]
    fn background_expiry_is_capped() {
        let key = PartitionKey::from("k");
        let stored = StoredBlob {
            blob: CacheBlob::new(),
            ttl: Duration::MAX,
            expires_at: None,
        };

        assert_eq!(
            BlobExpiry.expire_after_create(&key, &stored, Instant::now()),
            Some(MAX_BACKGROUND_EXPIRY)
        );
    }
}
