// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The token-cache provider and its builder.

use std::sync::Arc;

use tick::Clock;
use tokencache_memory::MemoryBackend;
use tokencache_tier::{CacheBackend, CacheBlob, CacheHints, ExpiryPolicy, PartitionKey, Result};

use crate::telemetry::ext::ClockExt;
use crate::telemetry::{CacheActivity, CacheOperation, PROVIDER};
use crate::{
    AccessOutcome, AccountId, BlobProtector, CacheTelemetry, ConfigError, PartitionKeyScheme, TieredBackend, TokenCacheNotifications,
    TokenCacheOptions,
};

const LOCAL_TIER_NAME: &str = "tokencache-l1";

/// Connects a token acquisition library to a [`CacheBackend`].
///
/// The provider answers the library's notifications (see [`TokenCacheNotifications`]),
/// derives keys through its [`PartitionKeyScheme`] and optionally runs blobs through a
/// [`BlobProtector`].
///
/// # Examples
///
/// ```
/// use tick::Clock;
/// use tokencache::{AccessOutcome, TokenCacheNotifications, TokenCacheProvider};
/// use tokencache_tier::{CacheBlob, CacheHints};
///
/// # futures::executor::block_on(async {
/// let provider = TokenCacheProvider::builder(Clock::new_frozen()).in_memory()?;
/// let key = provider.keys().app_key("clientA");
///
/// let outcome = AccessOutcome::from_flags(true, true, || CacheBlob::from_static(b"state"));
/// provider.on_after_access(&key, outcome, &CacheHints::new()).await?;
///
/// let blob = provider.on_before_access(&key, &mut CacheHints::new()).await?;
/// assert_eq!(blob.as_deref(), Some(&b"state"[..]));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TokenCacheProvider<B> {
    backend: B,
    keys: PartitionKeyScheme,
    protector: Option<Arc<dyn BlobProtector>>,
    telemetry: CacheTelemetry,
    clock: Clock,
}

impl TokenCacheProvider<MemoryBackend> {
    /// Creates a builder for a provider.
    #[must_use]
    pub fn builder(clock: Clock) -> TokenCacheProviderBuilder {
        TokenCacheProviderBuilder::new(clock)
    }
}

impl<B> TokenCacheProvider<B>
where
    B: CacheBackend,
{
    /// Creates a provider over an already configured backend.
    #[must_use]
    pub fn new(backend: B, keys: PartitionKeyScheme, clock: Clock) -> Self {
        Self {
            backend,
            keys,
            protector: None,
            telemetry: CacheTelemetry::default(),
            clock,
        }
    }

    /// Returns the key scheme.
    #[must_use]
    pub fn keys(&self) -> &PartitionKeyScheme {
        &self.keys
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Removes the partition stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to remove the partition.
    pub async fn clear(&self, key: &PartitionKey) -> Result<()> {
        let timed = self.clock.timed_async(self.backend.delete(key)).await;
        self.check(CacheOperation::Delete, timed.result)?;
        self.telemetry
            .record(PROVIDER, CacheOperation::Delete, CacheActivity::Removed, Some(timed.duration));
        Ok(())
    }

    /// Removes the partition holding `account`'s tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to remove the partition.
    pub async fn clear_account(&self, account: &AccountId) -> Result<()> {
        self.clear(&self.keys.user_key(account)).await
    }

    fn check<T>(&self, operation: CacheOperation, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.telemetry.record(PROVIDER, operation, CacheActivity::Error, None);
        }
        result
    }

    fn unprotect(&self, key: &PartitionKey, blob: CacheBlob) -> CacheBlob {
        let Some(protector) = &self.protector else {
            return blob;
        };

        match protector.unprotect(&blob) {
            Ok(plain) => plain,
            Err(error) => {
                tracing::debug!(cache.key = %key, error = %error, "blob is not protected, using it as stored");
                blob
            }
        }
    }
}

impl<B> TokenCacheNotifications for TokenCacheProvider<B>
where
    B: CacheBackend,
{
    async fn on_before_access(&self, key: &PartitionKey, hints: &mut CacheHints) -> Result<Option<CacheBlob>> {
        if key.is_empty() {
            return Ok(None);
        }

        let timed = self.clock.timed_async(self.backend.get(key, hints)).await;
        let Some(blob) = self.check(CacheOperation::Get, timed.result)? else {
            self.telemetry
                .record(PROVIDER, CacheOperation::Get, CacheActivity::Miss, Some(timed.duration));
            return Ok(None);
        };

        self.telemetry
            .record(PROVIDER, CacheOperation::Get, CacheActivity::Hit, Some(timed.duration));
        tracing::debug!(
            cache.key = %key,
            cache.level = hints.telemetry().cache_level().as_str(),
            "partition loaded"
        );
        Ok(Some(self.unprotect(key, blob)))
    }

    async fn on_after_access(&self, key: &PartitionKey, outcome: AccessOutcome, hints: &CacheHints) -> Result<()> {
        match outcome {
            AccessOutcome::Unchanged => Ok(()),
            AccessOutcome::Emptied => self.clear(key).await,
            AccessOutcome::Updated(blob) => {
                let blob = match &self.protector {
                    Some(protector) => protector.protect(&blob)?,
                    None => blob,
                };

                let timed = self.clock.timed_async(self.backend.set(key, blob, hints)).await;
                self.check(CacheOperation::Set, timed.result)?;
                self.telemetry
                    .record(PROVIDER, CacheOperation::Set, CacheActivity::Written, Some(timed.duration));
                Ok(())
            }
        }
    }
}

/// Builds a [`TokenCacheProvider`] from [`TokenCacheOptions`].
///
/// # Examples
///
/// ```
/// use tick::Clock;
/// use tokencache::{SharedFailurePolicy, TokenCacheOptions, TokenCacheProviderBuilder};
/// use tokencache_memory::MemoryBackend;
///
/// let clock = Clock::new_frozen();
/// let shared = MemoryBackend::new(clock.clone());
///
/// let provider = TokenCacheProviderBuilder::new(clock)
///     .options(
///         TokenCacheOptions::default()
///             .with_local_expiry_ratio(0.5)
///             .with_shared_failure_policy(SharedFailurePolicy::retry_recoverable()),
///     )
///     .distributed(shared)?;
/// assert!(provider.backend().local().is_some());
/// # Ok::<(), tokencache::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct TokenCacheProviderBuilder {
    clock: Clock,
    options: TokenCacheOptions,
    telemetry: CacheTelemetry,
    protector: Option<Arc<dyn BlobProtector>>,
}

impl TokenCacheProviderBuilder {
    /// Creates a builder with default options.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            options: TokenCacheOptions::default(),
            telemetry: CacheTelemetry::default(),
            protector: None,
        }
    }

    /// Sets the options.
    #[must_use]
    pub fn options(mut self, options: TokenCacheOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the telemetry sink.
    #[must_use]
    pub fn telemetry(mut self, telemetry: CacheTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Protects blobs at rest with `protector`.
    #[must_use]
    pub fn protector(mut self, protector: impl BlobProtector + 'static) -> Self {
        self.protector = Some(Arc::new(protector));
        self
    }

    /// Builds a provider that keeps partitions in process memory only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the options are invalid.
    pub fn in_memory(self) -> std::result::Result<TokenCacheProvider<MemoryBackend>, ConfigError> {
        self.options.validate()?;
        let backend = self.memory_tier(self.options.expiry_policy());
        Ok(self.finish(backend))
    }

    /// Builds a provider over `shared`, fronted by a process-local tier unless the
    /// options disable it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the options are invalid.
    pub fn distributed<S>(self, shared: S) -> std::result::Result<TokenCacheProvider<TieredBackend<S>>, ConfigError>
    where
        S: CacheBackend,
    {
        self.options.validate()?;
        let local = self
            .options
            .local_tier_enabled()
            .then(|| self.memory_tier(self.options.local_expiry_policy()));
        let backend = TieredBackend::new(local, shared, self.clock.clone())
            .with_failure_policy(self.options.shared_failure_policy().clone())
            .with_telemetry(self.telemetry.clone());
        Ok(self.finish(backend))
    }

    fn memory_tier(&self, expiry: ExpiryPolicy) -> MemoryBackend {
        let builder = MemoryBackend::builder(self.clock.clone())
            .expiry_policy(expiry)
            .name(LOCAL_TIER_NAME);
        let builder = match self.options.local_tier_size_limit() {
            Some(bytes) => builder.size_limit(bytes),
            None => builder,
        };
        builder.build()
    }

    fn finish<B>(self, backend: B) -> TokenCacheProvider<B> {
        TokenCacheProvider {
            backend,
            keys: self.options.key_scheme(),
            protector: self.protector,
            telemetry: self.telemetry,
            clock: self.clock,
        }
    }
}
