// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The capability trait implemented by every physical token-cache store.

use crate::{CacheBlob, CacheHints, PartitionKey, Result};

/// A store for serialized token-cache partitions.
///
/// A backend maps a [`PartitionKey`] to exactly one [`CacheBlob`]. Writes replace
/// the whole blob; there is no append or merge. Implementations must be safe to
/// call concurrently; operations on different keys are independent.
///
/// Each write carries [`CacheHints`] so the backend can derive the entry's
/// time-to-live, typically through an [`ExpiryPolicy`](crate::ExpiryPolicy). Reads
/// receive the hints mutably so the backend can record which level served the
/// blob; that record is informational only.
///
/// Cancellation is expressed by dropping the returned future.
#[cfg_attr(
    feature = "dynamic",
    dynosaur::dynosaur(pub(crate) DynCacheBackend = dyn(box) CacheBackend, bridge(none))
)]
pub trait CacheBackend: Send + Sync {
    /// Reads the blob stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent or its entry has expired.
    fn get(&self, key: &PartitionKey, hints: &mut CacheHints) -> impl Future<Output = Result<Option<CacheBlob>>> + Send;

    /// Stores `blob` under `key`, replacing any previous blob.
    fn set(&self, key: &PartitionKey, blob: CacheBlob, hints: &CacheHints) -> impl Future<Output = Result<()>> + Send;

    /// Removes the blob stored under `key`. Removing an absent key succeeds.
    fn delete(&self, key: &PartitionKey) -> impl Future<Output = Result<()>> + Send;

    /// Returns the number of stored partitions, if the backend tracks it.
    fn len(&self) -> Option<u64> {
        None
    }

    /// Returns `true` if the backend holds no partitions.
    ///
    /// Returns `None` for backends that don't track size.
    fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }
}
