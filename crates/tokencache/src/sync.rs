// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The notification surface used by a token acquisition library.
//!
//! The library loads a partition before it touches its in-memory token cache and
//! reports afterwards what happened to it. The two notifications map onto backend
//! calls as follows:
//!
//! | Notification | Backend call |
//! |--------------|--------------|
//! | before access | `get` |
//! | after access, [`AccessOutcome::Unchanged`] | none |
//! | after access, [`AccessOutcome::Updated`] | `set` |
//! | after access, [`AccessOutcome::Emptied`] | `delete` |

use tokencache_tier::{CacheBlob, CacheHints, PartitionKey, Result};

/// What happened to a partition while the token library worked on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    /// The partition was not modified.
    Unchanged,
    /// The partition was modified and still holds tokens; the blob is its new state.
    Updated(CacheBlob),
    /// The partition was modified and no longer holds tokens.
    Emptied,
}

impl AccessOutcome {
    /// Builds the outcome from the flags reported by the token library.
    ///
    /// `serialize` is only called when the partition changed and still holds tokens.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokencache::AccessOutcome;
    /// use tokencache_tier::CacheBlob;
    ///
    /// let outcome = AccessOutcome::from_flags(true, true, || CacheBlob::from_static(b"state"));
    /// assert_eq!(outcome, AccessOutcome::Updated(CacheBlob::from_static(b"state")));
    ///
    /// let outcome = AccessOutcome::from_flags(true, false, || unreachable!());
    /// assert_eq!(outcome, AccessOutcome::Emptied);
    /// ```
    pub fn from_flags<F>(state_changed: bool, has_tokens: bool, serialize: F) -> Self
    where
        F: FnOnce() -> CacheBlob,
    {
        match (state_changed, has_tokens) {
            (false, _) => Self::Unchanged,
            (true, true) => Self::Updated(serialize()),
            (true, false) => Self::Emptied,
        }
    }
}

/// Receives the token library's before-access and after-access notifications.
pub trait TokenCacheNotifications: Send + Sync {
    /// Loads the partition stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing is stored, when the entry expired, or when `key`
    /// is empty. `hints` receives the level that served the read.
    fn on_before_access(&self, key: &PartitionKey, hints: &mut CacheHints) -> impl Future<Output = Result<Option<CacheBlob>>> + Send;

    /// Persists the partition's new state, or removes it once it holds no tokens.
    fn on_after_access(&self, key: &PartitionKey, outcome: AccessOutcome, hints: &CacheHints) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_never_serializes() {
        let outcome = AccessOutcome::from_flags(false, true, || panic!("must not serialize"));
        assert_eq!(outcome, AccessOutcome::Unchanged);
    }

    #[test]
    fn emptied_never_serializes() {
        let outcome = AccessOutcome::from_flags(true, false, || panic!("must not serialize"));
        assert_eq!(outcome, AccessOutcome::Emptied);
    }

    #[test]
    fn updated_carries_blob() {
        let outcome = AccessOutcome::from_flags(true, true, || CacheBlob::from_static(b"s"));
        assert_eq!(outcome, AccessOutcome::Updated(CacheBlob::from_static(b"s")));
    }
}
