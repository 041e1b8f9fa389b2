// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Display};
use std::sync::Arc;

/// The serialized state of one token-cache partition.
///
/// The content is opaque to this crate: it is produced and consumed by the token
/// acquisition library and is never parsed here.
pub type CacheBlob = bytes::Bytes;

/// Identifies one token-cache partition.
///
/// Keys are cheap to clone; the text is shared.
///
/// # Examples
///
/// ```
/// use tokencache_tier::PartitionKey;
///
/// let key = PartitionKey::from("App-clientA");
/// assert_eq!(key.as_str(), "App-clientA");
/// assert!(!key.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey(Arc<str>);

impl PartitionKey {
    /// Creates a key from its textual form.
    #[must_use]
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Returns the textual form of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the key is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for PartitionKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PartitionKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for PartitionKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_as_str() {
        let key = PartitionKey::from(String::from("User-tenantT-subjectS"));
        assert_eq!(key.to_string(), key.as_str());
    }

    #[test]
    fn empty_key_is_reported() {
        assert!(PartitionKey::from("").is_empty());
    }

    #[test]
    fn clones_compare_equal() {
        let key = PartitionKey::from("App-clientA");
        assert_eq!(key.clone(), key);
    }
}
