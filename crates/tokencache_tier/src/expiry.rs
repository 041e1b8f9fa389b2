// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Negotiation between caller-suggested expiry and configured policy.

use std::time::{Duration, SystemTime};

use crate::CacheHints;

/// The smallest lifetime ever assigned to an entry.
///
/// A suggested expiry at or before "now" still produces this lifetime; an entry
/// with a zero or negative lifetime would be rejected by most stores.
pub const MIN_ENTRY_TTL: Duration = Duration::from_millis(1);

/// Default ceiling on entry lifetimes: 14 days.
pub const DEFAULT_ABSOLUTE_EXPIRY: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Computes the time-to-live of a cache write.
///
/// The policy holds a ceiling. Without a suggested expiry the ceiling is used as is.
/// With one, the lifetime is the time remaining until the suggested expiry, at least
/// [`MIN_ENTRY_TTL`] and at most the ceiling.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
///
/// use tokencache_tier::{CacheHints, ExpiryPolicy};
///
/// let policy = ExpiryPolicy::new(Duration::from_secs(3600));
/// let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
///
/// let hints = CacheHints::new().with_suggested_expiry(now + Duration::from_secs(60));
/// assert_eq!(policy.effective_ttl(&hints, now), Duration::from_secs(60));
///
/// let hints = CacheHints::new().with_suggested_expiry(now + Duration::from_secs(7200));
/// assert_eq!(policy.effective_ttl(&hints, now), Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpiryPolicy {
    ceiling: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ABSOLUTE_EXPIRY)
    }
}

impl ExpiryPolicy {
    /// Creates a policy with the given ceiling.
    ///
    /// A zero ceiling is raised to [`MIN_ENTRY_TTL`].
    #[must_use]
    pub fn new(ceiling: Duration) -> Self {
        Self {
            ceiling: ceiling.max(MIN_ENTRY_TTL),
        }
    }

    /// Returns the configured ceiling.
    #[must_use]
    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// Returns the lifetime of an entry written at `now` with the given hints.
    ///
    /// The result is always strictly positive.
    #[must_use]
    pub fn effective_ttl(&self, hints: &CacheHints, now: SystemTime) -> Duration {
        let Some(expiry) = hints.suggested_expiry() else {
            return self.ceiling;
        };

        let remaining = expiry.duration_since(now).map_or(MIN_ENTRY_TTL, |delta| delta.max(MIN_ENTRY_TTL));
        remaining.min(self.ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    #[test]
    fn default_ceiling_is_fourteen_days() {
        assert_eq!(ExpiryPolicy::default().ceiling(), 14 * DAY);
    }

    #[test]
    fn no_suggestion_uses_ceiling() {
        let policy = ExpiryPolicy::new(DAY);
        assert_eq!(policy.effective_ttl(&CacheHints::new(), now()), DAY);
    }

    #[test]
    fn past_suggestion_clamps_to_minimum() {
        let policy = ExpiryPolicy::default();
        let hints = CacheHints::new().with_suggested_expiry(now() - Duration::from_secs(1));

        let ttl = policy.effective_ttl(&hints, now());

        assert!(ttl > Duration::ZERO);
        assert_eq!(ttl, MIN_ENTRY_TTL);
    }

    #[test]
    fn suggestion_equal_to_now_clamps_to_minimum() {
        let hints = CacheHints::new().with_suggested_expiry(now());
        assert_eq!(ExpiryPolicy::default().effective_ttl(&hints, now()), MIN_ENTRY_TTL);
    }

    #[test]
    fn distant_suggestion_is_capped_by_ceiling() {
        let hints = CacheHints::new().with_suggested_expiry(now() + 30 * DAY);
        assert_eq!(ExpiryPolicy::default().effective_ttl(&hints, now()), 14 * DAY);
    }

    #[test]
    fn near_suggestion_is_used_as_is() {
        let hints = CacheHints::new().with_suggested_expiry(now() + Duration::from_secs(300));
        assert_eq!(ExpiryPolicy::default().effective_ttl(&hints, now()), Duration::from_secs(300));
    }

    #[test]
    fn zero_ceiling_is_raised_to_minimum() {
        let policy = ExpiryPolicy::new(Duration::ZERO);
        assert_eq!(policy.ceiling(), MIN_ENTRY_TTL);
        assert_eq!(policy.effective_ttl(&CacheHints::new(), now()), MIN_ENTRY_TTL);
    }
}
