// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Policy deciding whether a failed shared-tier call is retried.

use std::sync::Arc;

use recoverable::{Recovery, RecoveryKind};
use tokencache_tier::Error;

/// Decides whether a failed shared-tier operation is retried.
///
/// The shared tier gets exactly one retry when the policy returns `true` for the first
/// error. If the policy returns `false`, or the retry fails as well, the failure is
/// absorbed: reads report a miss and writes or removals are logged and dropped. The
/// policy is never consulted for local-tier failures.
///
/// # Examples
///
/// ```
/// use tokencache::SharedFailurePolicy;
///
/// // Never retry (default).
/// let policy = SharedFailurePolicy::never();
///
/// // Retry errors that declare themselves transient.
/// let policy = SharedFailurePolicy::retry_recoverable();
///
/// // Custom predicate, for example matching timeouts by message.
/// let policy = SharedFailurePolicy::when(|error| error.to_string().contains("timed out"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct SharedFailurePolicy(PolicyType);

#[derive(Clone, Default)]
enum PolicyType {
    #[default]
    Never,
    Always,
    Recoverable,
    When(Arc<dyn Fn(&Error) -> bool + Send + Sync>),
}

impl std::fmt::Debug for PolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Never => write!(f, "Never"),
            Self::Always => write!(f, "Always"),
            Self::Recoverable => write!(f, "Recoverable"),
            Self::When(_) => write!(f, "When(<closure>)"),
        }
    }
}

impl SharedFailurePolicy {
    /// Never retries; every shared-tier failure degrades immediately.
    #[must_use]
    pub fn never() -> Self {
        Self(PolicyType::Never)
    }

    /// Retries every shared-tier failure once.
    #[must_use]
    pub fn always() -> Self {
        Self(PolicyType::Always)
    }

    /// Retries once when the error's recovery kind is [`RecoveryKind::Retry`].
    #[must_use]
    pub fn retry_recoverable() -> Self {
        Self(PolicyType::Recoverable)
    }

    /// Retries once when `predicate` returns `true` for the error.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        Self(PolicyType::When(Arc::new(predicate)))
    }

    /// Returns `true` if the failed operation should be attempted once more.
    #[must_use]
    pub fn should_retry(&self, error: &Error) -> bool {
        match &self.0 {
            PolicyType::Never => false,
            PolicyType::Always => true,
            PolicyType::Recoverable => error.recovery().kind() == RecoveryKind::Retry,
            PolicyType::When(predicate) => predicate(error),
        }
    }
}
