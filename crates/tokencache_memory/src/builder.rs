// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring memory backends.
//!
//! The builder keeps moka out of the public API.

use std::time::Duration;

use tick::Clock;
use tokencache_tier::ExpiryPolicy;

use crate::MemoryBackend;

/// Builder for a [`MemoryBackend`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use tick::Clock;
/// use tokencache_memory::MemoryBackend;
///
/// let backend = MemoryBackend::builder(Clock::new_frozen())
///     .size_limit(500 * 1024 * 1024)
///     .initial_capacity(128)
///     .default_expiry(Duration::from_secs(3600))
///     .name("token-cache-l1")
///     .build();
/// assert_eq!(backend.name(), Some("token-cache-l1"));
/// ```
#[derive(Debug)]
pub struct MemoryBackendBuilder {
    pub(crate) clock: Clock,
    pub(crate) size_limit: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) expiry: ExpiryPolicy,
    pub(crate) name: Option<String>,
}

impl MemoryBackendBuilder {
    /// Creates a builder for an unbounded backend with the default 14 day expiry ceiling.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            size_limit: None,
            initial_capacity: None,
            expiry: ExpiryPolicy::default(),
            name: None,
        }
    }

    /// Limits the total size of stored keys and blobs, in bytes.
    ///
    /// When the budget is exceeded, entries are evicted using moka's `TinyLFU` policy.
    /// Without a limit the backend is bounded only by available memory.
    #[must_use]
    pub fn size_limit(mut self, bytes: u64) -> Self {
        self.size_limit = Some(bytes);
        self
    }

    /// Sets the number of entries to pre-allocate room for.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets the ceiling on entry lifetimes.
    #[must_use]
    pub fn default_expiry(self, ceiling: Duration) -> Self {
        self.expiry_policy(ExpiryPolicy::new(ceiling))
    }

    /// Sets the policy that computes entry lifetimes.
    #[must_use]
    pub fn expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry = policy;
        self
    }

    /// Names the backend. The name shows up in logs and in moka's debugging output.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured backend.
    #[must_use]
    pub fn build(self) -> MemoryBackend {
        MemoryBackend::from_builder(self)
    }
}
