// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for token-cache storage operations.

use recoverable::{Recovery, RecoveryInfo};

/// An error from a cache backend.
///
/// The error wraps the underlying cause and carries [`RecoveryInfo`] describing
/// whether repeating the operation may succeed. Failure policies inspect it through
/// the [`Recovery`] trait.
///
/// # Examples
///
/// ```
/// use recoverable::{Recovery, RecoveryKind};
/// use tokencache_tier::Error;
///
/// let error = Error::transient("connection reset");
/// assert_eq!(error.recovery().kind(), RecoveryKind::Retry);
/// ```
#[ohno::error]
pub struct Error {
    recovery: RecoveryInfo,
}

impl Error {
    /// Creates an error whose recoverability is unknown.
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(RecoveryInfo::unknown(), cause)
    }

    /// Creates an error for a failure that may succeed if repeated, such as a timeout.
    pub fn transient(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(RecoveryInfo::retry(), cause)
    }

    /// Creates an error for a failure that will not succeed if repeated.
    pub fn permanent(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(RecoveryInfo::never(), cause)
    }

    /// Creates an error with explicit recovery information.
    pub fn with_recovery(recovery: RecoveryInfo, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(recovery, cause)
    }
}

impl Recovery for Error {
    fn recovery(&self) -> RecoveryInfo {
        self.recovery.clone()
    }
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use recoverable::RecoveryKind;

    use super::*;

    #[test]
    fn display_contains_cause_message() {
        let error = Error::from_message("display test");
        let display_str = format!("{error}");
        assert!(
            display_str.contains("display test"),
            "display output should contain the cause message, got: {display_str}"
        );
    }

    #[test]
    fn constructors_set_recovery_kind() {
        assert_eq!(Error::from_message("a").recovery().kind(), RecoveryKind::Unknown);
        assert_eq!(Error::transient("b").recovery().kind(), RecoveryKind::Retry);
        assert_eq!(Error::permanent("c").recovery().kind(), RecoveryKind::Never);
        assert_eq!(
            Error::with_recovery(RecoveryInfo::unavailable(), "d").recovery().kind(),
            RecoveryKind::Unavailable
        );
    }

    #[test]
    fn result_alias_propagates_errors() {
        fn returns_err() -> Result<i32> {
            Err(Error::transient("expected failure"))
        }

        let err = returns_err().expect_err("should return an error");
        assert!(format!("{err}").contains("expected failure"));
    }
}
