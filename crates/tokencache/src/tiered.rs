// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Process-local tier in front of a shared tier.

use tick::Clock;
use tokencache_memory::MemoryBackend;
use tokencache_tier::{CacheBackend, CacheBlob, CacheHints, CacheLevel, PartitionKey, Result};

use crate::SharedFailurePolicy;
use crate::telemetry::ext::ClockExt;
use crate::telemetry::{CacheActivity, CacheOperation, CacheTelemetry, LOCAL_TIER, SHARED_TIER};

/// A two-tier backend: an optional [`MemoryBackend`] in front of a shared backend.
///
/// The shared tier is the source of truth. Reads try the local tier first and fall
/// through to the shared tier, copying hits back into the local tier. Writes and
/// removals go to the shared tier first and then to the local tier.
///
/// A shared-tier outage never fails an operation. Each shared-tier error is shown to
/// the [`SharedFailurePolicy`], which may ask for a single retry. When it does not, or
/// when the retry fails too, a read reports a miss and a write or removal is logged and
/// dropped. A write removes the local copy before contacting the shared tier and stores
/// the new blob locally only after the shared tier accepted it, so neither a dropped nor
/// a cancelled write leaves the local tier out of step. Local-tier errors are returned
/// as is.
///
/// # Examples
///
/// ```
/// use tick::Clock;
/// use tokencache::TieredBackend;
/// use tokencache_memory::MemoryBackend;
/// use tokencache_tier::{CacheBackend, CacheBlob, CacheHints, CacheLevel, PartitionKey};
///
/// # futures::executor::block_on(async {
/// let clock = Clock::new_frozen();
/// let shared = MemoryBackend::new(clock.clone());
/// let tiered = TieredBackend::new(Some(MemoryBackend::new(clock.clone())), shared.clone(), clock);
///
/// let key = PartitionKey::from("App-clientA");
/// shared.set(&key, CacheBlob::from_static(b"state"), &CacheHints::new()).await?;
///
/// let mut hints = CacheHints::new();
/// assert!(tiered.get(&key, &mut hints).await?.is_some());
/// assert_eq!(hints.telemetry().cache_level(), CacheLevel::L2);
///
/// let mut hints = CacheHints::new();
/// assert!(tiered.get(&key, &mut hints).await?.is_some());
/// assert_eq!(hints.telemetry().cache_level(), CacheLevel::L1);
/// # Ok::<(), tokencache_tier::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TieredBackend<S> {
    local: Option<MemoryBackend>,
    shared: S,
    failure_policy: SharedFailurePolicy,
    telemetry: CacheTelemetry,
    clock: Clock,
}

impl<S> TieredBackend<S>
where
    S: CacheBackend,
{
    /// Creates a two-tier backend. Pass `None` as `local` to use the shared tier alone.
    ///
    /// Shared-tier failures are never retried until a policy is set with
    /// [`with_failure_policy`](Self::with_failure_policy).
    #[must_use]
    pub fn new(local: Option<MemoryBackend>, shared: S, clock: Clock) -> Self {
        Self {
            local,
            shared,
            failure_policy: SharedFailurePolicy::never(),
            telemetry: CacheTelemetry::default(),
            clock,
        }
    }

    /// Sets the policy applied to shared-tier failures.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: SharedFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets the telemetry sink.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: CacheTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Returns the local tier, if enabled.
    #[must_use]
    pub fn local(&self) -> Option<&MemoryBackend> {
        self.local.as_ref()
    }

    /// Returns the shared tier.
    #[must_use]
    pub fn shared(&self) -> &S {
        &self.shared
    }

    /// Runs a shared-tier call under the failure policy.
    ///
    /// Returns `None` when the failure was absorbed.
    async fn call_shared<T, F, Fut>(&self, operation: CacheOperation, key: &PartitionKey, mut call: F) -> Option<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let mut retried = false;
        loop {
            let timed = self.clock.timed_async(call()).await;
            let error = match timed.result {
                Ok(value) => return Some(value),
                Err(error) => error,
            };

            if !retried && self.failure_policy.should_retry(&error) {
                retried = true;
                tracing::warn!(
                    cache.key = %key,
                    cache.operation = operation.as_str(),
                    error = %error,
                    "shared tier operation failed, retrying once"
                );
                self.telemetry
                    .record(SHARED_TIER, operation, CacheActivity::Retried, Some(timed.duration));
                continue;
            }

            tracing::warn!(
                cache.key = %key,
                cache.operation = operation.as_str(),
                retried,
                error = %error,
                "shared tier operation failed, continuing without it"
            );
            self.telemetry
                .record(SHARED_TIER, operation, CacheActivity::Degraded, Some(timed.duration));
            return None;
        }
    }

    fn record_local_size(&self, local: &MemoryBackend) {
        if let Some(size) = local.len() {
            self.telemetry.record_size(LOCAL_TIER, size);
        }
    }
}

impl<S> CacheBackend for TieredBackend<S>
where
    S: CacheBackend,
{
    async fn get(&self, key: &PartitionKey, hints: &mut CacheHints) -> Result<Option<CacheBlob>> {
        if let Some(local) = &self.local {
            let timed = self.clock.timed_async(local.get(key, hints)).await;
            if let Some(blob) = timed.result? {
                self.telemetry
                    .record(LOCAL_TIER, CacheOperation::Get, CacheActivity::Hit, Some(timed.duration));
                return Ok(Some(blob));
            }
            self.telemetry
                .record(LOCAL_TIER, CacheOperation::Get, CacheActivity::Miss, Some(timed.duration));
        }

        let shared = &self.shared;
        let read_hints = hints.clone();
        let Some(found) = self
            .call_shared(CacheOperation::Get, key, move || {
                let mut attempt_hints = read_hints.clone();
                async move { shared.get(key, &mut attempt_hints).await }
            })
            .await
        else {
            return Ok(None);
        };

        let Some(blob) = found else {
            self.telemetry.record(SHARED_TIER, CacheOperation::Get, CacheActivity::Miss, None);
            return Ok(None);
        };
        self.telemetry.record(SHARED_TIER, CacheOperation::Get, CacheActivity::Hit, None);

        if let Some(local) = &self.local {
            local.set(key, blob.clone(), hints).await?;
            self.telemetry.record(LOCAL_TIER, CacheOperation::Set, CacheActivity::Promoted, None);
            self.record_local_size(local);
        }

        hints.record_served_from(CacheLevel::L2);
        Ok(Some(blob))
    }

    async fn set(&self, key: &PartitionKey, blob: CacheBlob, hints: &CacheHints) -> Result<()> {
        // Invalidate first: if this future is dropped mid-write, the local tier must not
        // keep serving the blob the shared tier just replaced.
        if let Some(local) = &self.local {
            local.delete(key).await?;
        }

        let shared = &self.shared;
        let shared_blob = blob.clone();
        let written = self
            .call_shared(CacheOperation::Set, key, move || shared.set(key, shared_blob.clone(), hints))
            .await;
        if written.is_none() {
            return Ok(());
        }
        self.telemetry.record(SHARED_TIER, CacheOperation::Set, CacheActivity::Written, None);

        if let Some(local) = &self.local {
            local.set(key, blob, hints).await?;
            self.telemetry.record(LOCAL_TIER, CacheOperation::Set, CacheActivity::Written, None);
            self.record_local_size(local);
        }

        Ok(())
    }

    async fn delete(&self, key: &PartitionKey) -> Result<()> {
        let shared = &self.shared;
        if self
            .call_shared(CacheOperation::Delete, key, move || shared.delete(key))
            .await
            .is_some()
        {
            self.telemetry.record(SHARED_TIER, CacheOperation::Delete, CacheActivity::Removed, None);
        }

        if let Some(local) = &self.local {
            local.delete(key).await?;
            self.telemetry.record(LOCAL_TIER, CacheOperation::Delete, CacheActivity::Removed, None);
        }

        Ok(())
    }

    fn len(&self) -> Option<u64> {
        self.shared.len()
    }
}
