// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-call hints exchanged between the token library and a backend.

use std::time::SystemTime;

/// The storage level that served a read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CacheLevel {
    /// Nothing served the read, or the read has not happened yet.
    #[default]
    None,
    /// The process-local tier.
    L1,
    /// The shared tier.
    L2,
}

impl CacheLevel {
    /// Returns a stable lowercase name, suitable for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::L1 => "l1",
            Self::L2 => "l2",
        }
    }
}

/// Telemetry filled in by a backend while serving a read.
///
/// The record is informational; nothing in the cache reads it back to make a decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryRecord {
    cache_level: CacheLevel,
}

impl TelemetryRecord {
    /// Returns the level that served the last read.
    #[must_use]
    pub fn cache_level(&self) -> CacheLevel {
        self.cache_level
    }

    /// Records the level that served a read.
    pub fn set_cache_level(&mut self, level: CacheLevel) {
        self.cache_level = level;
    }
}

/// Hints accompanying a cache operation.
///
/// The token library may know when the tokens inside a partition expire and passes
/// that as the suggested expiry. Backends feed the hints to an
/// [`ExpiryPolicy`](crate::ExpiryPolicy) to compute the entry lifetime.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
///
/// use tokencache_tier::{CacheHints, CacheLevel};
///
/// let expiry = SystemTime::UNIX_EPOCH + Duration::from_secs(3600);
/// let mut hints = CacheHints::new().with_suggested_expiry(expiry);
/// assert_eq!(hints.suggested_expiry(), Some(expiry));
///
/// hints.record_served_from(CacheLevel::L2);
/// assert_eq!(hints.telemetry().cache_level(), CacheLevel::L2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheHints {
    suggested_expiry: Option<SystemTime>,
    telemetry: TelemetryRecord,
}

impl CacheHints {
    /// Creates hints with no suggested expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the absolute time at which the partition's content stops being useful.
    #[must_use]
    pub fn with_suggested_expiry(mut self, expiry: SystemTime) -> Self {
        self.suggested_expiry = Some(expiry);
        self
    }

    /// Returns the suggested absolute expiry, if any.
    #[must_use]
    pub fn suggested_expiry(&self) -> Option<SystemTime> {
        self.suggested_expiry
    }

    /// Returns the telemetry recorded so far.
    #[must_use]
    pub fn telemetry(&self) -> &TelemetryRecord {
        &self.telemetry
    }

    /// Returns the telemetry record for modification.
    pub fn telemetry_mut(&mut self) -> &mut TelemetryRecord {
        &mut self.telemetry
    }

    /// Shorthand for `telemetry_mut().set_cache_level(level)`.
    pub fn record_served_from(&mut self, level: CacheLevel) {
        self.telemetry.set_cache_level(level);
    }
}
