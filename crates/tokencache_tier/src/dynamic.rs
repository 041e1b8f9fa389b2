// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type-erased backend wrapper.

use std::{fmt::Debug, sync::Arc};

use crate::{CacheBackend, CacheBlob, CacheHints, PartitionKey, Result, backend::DynCacheBackend};

/// Converts any [`CacheBackend`] into a [`DynamicBackend`].
///
/// # Examples
///
/// ```
/// use tokencache_tier::{CacheBackend, DynamicBackend, DynamicBackendExt};
///
/// fn erase<B: CacheBackend + 'static>(backend: B) -> DynamicBackend {
///     backend.into_dynamic()
/// }
/// ```
pub trait DynamicBackendExt: Sized {
    /// Wraps this backend in a [`DynamicBackend`].
    fn into_dynamic(self) -> DynamicBackend;
}

impl<T> DynamicBackendExt for T
where
    T: CacheBackend + 'static,
{
    fn into_dynamic(self) -> DynamicBackend {
        DynamicBackend::new(self)
    }
}

/// A clonable, type-erased [`CacheBackend`].
///
/// Useful when the shared tier is chosen at runtime, for example from configuration.
pub struct DynamicBackend(Arc<DynCacheBackend<'static>>);

impl DynamicBackend {
    /// Creates a dynamic backend from any [`CacheBackend`] implementation.
    pub fn new<T>(backend: T) -> Self
    where
        T: CacheBackend + 'static,
    {
        Self(DynCacheBackend::new_arc(backend))
    }
}

impl Debug for DynamicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicBackend").finish_non_exhaustive()
    }
}

impl Clone for DynamicBackend {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl CacheBackend for DynamicBackend {
    async fn get(&self, key: &PartitionKey, hints: &mut CacheHints) -> Result<Option<CacheBlob>> {
        self.0.get(key, hints).await
    }

    async fn set(&self, key: &PartitionKey, blob: CacheBlob, hints: &CacheHints) -> Result<()> {
        self.0.set(key, blob, hints).await
    }

    async fn delete(&self, key: &PartitionKey) -> Result<()> {
        self.0.delete(key).await
    }

    fn len(&self) -> Option<u64> {
        self.0.len()
    }

    fn is_empty(&self) -> Option<bool> {
        self.0.is_empty()
    }
}
