// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// An invalid token-cache option, reported when a provider is built.
///
/// # Examples
///
/// ```
/// use tokencache::TokenCacheOptions;
///
/// let options = TokenCacheOptions::default().with_local_expiry_ratio(1.5);
/// let error = options.validate().unwrap_err();
/// assert_eq!(error.option(), "local_expiry_ratio");
/// ```
#[ohno::error]
#[display("invalid token cache option `{option}`")]
pub struct ConfigError {
    option: &'static str,
}

impl ConfigError {
    /// Returns the name of the offending option.
    #[must_use]
    pub fn option(&self) -> &'static str {
        self.option
    }
}
