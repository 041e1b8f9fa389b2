// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Token-cache configuration.

use std::time::Duration;

use tokencache_tier::{DEFAULT_ABSOLUTE_EXPIRY, ExpiryPolicy};

use crate::{ConfigError, PartitionKeyScheme, SharedFailurePolicy};

/// Default byte budget of the process-local tier: 500 MiB.
pub const DEFAULT_LOCAL_TIER_SIZE_LIMIT: u64 = 500 * 1024 * 1024;

/// Configuration of a token-cache provider.
///
/// Options are plain values; nothing is read from the environment. Invalid values are
/// reported by [`validate`](Self::validate), which the provider builder calls.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use tokencache::{SharedFailurePolicy, TokenCacheOptions};
///
/// let options = TokenCacheOptions::default()
///     .with_default_absolute_expiry(Duration::from_secs(90 * 24 * 60 * 60))
///     .with_local_expiry_ratio(0.5)
///     .with_shared_failure_policy(SharedFailurePolicy::retry_recoverable())
///     .with_key_prefix("contoso");
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct TokenCacheOptions {
    default_absolute_expiry: Duration,
    enable_local_tier: bool,
    local_tier_size_limit: Option<u64>,
    local_expiry_ratio: f64,
    on_shared_tier_failure: SharedFailurePolicy,
    key_prefix: Option<String>,
}

impl Default for TokenCacheOptions {
    fn default() -> Self {
        Self {
            default_absolute_expiry: DEFAULT_ABSOLUTE_EXPIRY,
            enable_local_tier: true,
            local_tier_size_limit: Some(DEFAULT_LOCAL_TIER_SIZE_LIMIT),
            local_expiry_ratio: 1.0,
            on_shared_tier_failure: SharedFailurePolicy::never(),
            key_prefix: None,
        }
    }
}

impl TokenCacheOptions {
    /// Sets the ceiling on entry lifetimes. Must be non-zero; defaults to 14 days.
    #[must_use]
    pub fn with_default_absolute_expiry(mut self, expiry: Duration) -> Self {
        self.default_absolute_expiry = expiry;
        self
    }

    /// Enables or disables the process-local tier in front of a shared tier.
    #[must_use]
    pub fn with_local_tier(mut self, enabled: bool) -> Self {
        self.enable_local_tier = enabled;
        self
    }

    /// Sets the byte budget of the process-local tier; `None` leaves it unbounded.
    #[must_use]
    pub fn with_local_tier_size_limit(mut self, bytes: Option<u64>) -> Self {
        self.local_tier_size_limit = bytes;
        self
    }

    /// Scales the local tier's lifetime ceiling relative to the default expiry.
    ///
    /// Must be in `(0, 1]`. A ratio below one makes local copies expire before the
    /// shared entry, so instances pick up changes written by their peers sooner.
    #[must_use]
    pub fn with_local_expiry_ratio(mut self, ratio: f64) -> Self {
        self.local_expiry_ratio = ratio;
        self
    }

    /// Sets the policy applied to shared-tier failures.
    #[must_use]
    pub fn with_shared_failure_policy(mut self, policy: SharedFailurePolicy) -> Self {
        self.on_shared_tier_failure = policy;
        self
    }

    /// Prefixes every partition key, isolating applications that share a store.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Returns the ceiling on entry lifetimes.
    #[must_use]
    pub fn default_absolute_expiry(&self) -> Duration {
        self.default_absolute_expiry
    }

    /// Returns whether the process-local tier is enabled.
    #[must_use]
    pub fn local_tier_enabled(&self) -> bool {
        self.enable_local_tier
    }

    /// Returns the byte budget of the process-local tier.
    #[must_use]
    pub fn local_tier_size_limit(&self) -> Option<u64> {
        self.local_tier_size_limit
    }

    /// Returns the local tier's lifetime ratio.
    #[must_use]
    pub fn local_expiry_ratio(&self) -> f64 {
        self.local_expiry_ratio
    }

    /// Returns the shared-tier failure policy.
    #[must_use]
    pub fn shared_failure_policy(&self) -> &SharedFailurePolicy {
        &self.on_shared_tier_failure
    }

    /// Returns the key scheme described by these options.
    #[must_use]
    pub fn key_scheme(&self) -> PartitionKeyScheme {
        self.key_prefix
            .as_deref()
            .map_or_else(PartitionKeyScheme::new, PartitionKeyScheme::with_prefix)
    }

    /// Returns the expiry policy for the shared tier, or for a memory-only cache.
    #[must_use]
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy::new(self.default_absolute_expiry)
    }

    /// Returns the expiry policy for the local tier in front of a shared tier.
    ///
    /// Falls back to [`expiry_policy`](Self::expiry_policy) if the ratio is invalid.
    #[must_use]
    pub fn local_expiry_policy(&self) -> ExpiryPolicy {
        if self.ratio_is_valid() && self.local_expiry_ratio < 1.0 {
            ExpiryPolicy::new(self.default_absolute_expiry.mul_f64(self.local_expiry_ratio))
        } else {
            self.expiry_policy()
        }
    }

    /// Checks every option.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_absolute_expiry.is_zero() {
            return Err(ConfigError::caused_by("default_absolute_expiry", "must be greater than zero"));
        }

        if !self.ratio_is_valid() {
            return Err(ConfigError::caused_by(
                "local_expiry_ratio",
                format!("must be in (0, 1], got {}", self.local_expiry_ratio),
            ));
        }

        if self.local_tier_size_limit == Some(0) {
            return Err(ConfigError::caused_by("local_tier_size_limit", "must be greater than zero"));
        }

        Ok(())
    }

    fn ratio_is_valid(&self) -> bool {
        self.local_expiry_ratio > 0.0 && self.local_expiry_ratio <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn defaults() {
        let options = TokenCacheOptions::default();

        assert_eq!(options.default_absolute_expiry(), 14 * DAY);
        assert!(options.local_tier_enabled());
        assert_eq!(options.local_tier_size_limit(), Some(500 * 1024 * 1024));
        assert!((options.local_expiry_ratio() - 1.0).abs() < f64::EPSILON);
        assert_eq!(options.key_scheme(), PartitionKeyScheme::new());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn ratio_must_be_within_unit_interval() {
        for ratio in [0.0, -0.5, 1.01, f64::NAN] {
            let error = TokenCacheOptions::default()
                .with_local_expiry_ratio(ratio)
                .validate()
                .expect_err("ratio should be rejected");
            assert_eq!(error.option(), "local_expiry_ratio");
        }

        for ratio in [0.01, 0.5, 1.0] {
            assert!(TokenCacheOptions::default().with_local_expiry_ratio(ratio).validate().is_ok());
        }
    }

    #[test]
    fn zero_expiry_is_rejected() {
        let error = TokenCacheOptions::default()
            .with_default_absolute_expiry(Duration::ZERO)
            .validate()
            .expect_err("zero expiry should be rejected");
        assert_eq!(error.option(), "default_absolute_expiry");
        assert!(error.to_string().contains("default_absolute_expiry"));
    }

    #[test]
    fn zero_size_limit_is_rejected() {
        let error = TokenCacheOptions::default()
            .with_local_tier_size_limit(Some(0))
            .validate()
            .expect_err("zero budget should be rejected");
        assert_eq!(error.option(), "local_tier_size_limit");

        assert!(TokenCacheOptions::default().with_local_tier_size_limit(None).validate().is_ok());
    }

    #[test]
    fn local_policy_scales_ceiling() {
        let options = TokenCacheOptions::default()
            .with_default_absolute_expiry(10 * DAY)
            .with_local_expiry_ratio(0.5);

        assert_eq!(options.expiry_policy().ceiling(), 10 * DAY);
        assert_eq!(options.local_expiry_policy().ceiling(), 5 * DAY);
    }

    #[test]
    fn invalid_ratio_does_not_scale() {
        let options = TokenCacheOptions::default().with_local_expiry_ratio(7.0);
        assert_eq!(options.local_expiry_policy(), options.expiry_policy());
    }

    #[test]
    fn prefix_flows_into_key_scheme() {
        let options = TokenCacheOptions::default().with_key_prefix("contoso");
        assert_eq!(options.key_scheme().app_key("c").as_str(), "contoso-App-c");
    }
}
