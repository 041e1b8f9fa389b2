// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Derivation of partition keys from application and account identity.

use std::fmt::{self, Display};

use tokencache_tier::PartitionKey;

/// A stable account identity: the tenant the account signed in to and its subject
/// (object) identifier within that tenant.
///
/// # Examples
///
/// ```
/// use tokencache::AccountId;
///
/// let account = AccountId::from_home_account_id("subjectS.tenantT").unwrap();
/// assert_eq!(account.tenant_id(), "tenantT");
/// assert_eq!(account.subject_id(), "subjectS");
/// assert_eq!(account.to_string(), "tenantT-subjectS");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId {
    tenant_id: String,
    subject_id: String,
}

impl AccountId {
    /// Creates an account identity from its tenant and subject identifiers.
    #[must_use]
    pub fn new(tenant_id: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            subject_id: subject_id.into(),
        }
    }

    /// Parses a home account identifier of the form `<subject>.<tenant>`.
    ///
    /// The split happens at the last `.`, so subjects that contain dots are kept whole.
    /// Returns `None` unless both parts are non-blank.
    #[must_use]
    pub fn from_home_account_id(home_account_id: &str) -> Option<Self> {
        let (subject, tenant) = home_account_id.rsplit_once('.')?;
        let subject = subject.trim();
        let tenant = tenant.trim();
        (!subject.is_empty() && !tenant.is_empty()).then(|| Self::new(tenant, subject))
    }

    /// Returns the tenant identifier.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Returns the subject identifier.
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.tenant_id, self.subject_id)
    }
}

/// Derives partition keys.
///
/// Keys are pure functions of their inputs: the same identity always maps to the same
/// key, and different processes configured with the same prefix agree on every key.
///
/// | Partition | Key |
/// |-----------|-----|
/// | application | `[<prefix>-]App-<clientId>` |
/// | account | `[<prefix>-]User-<tenant>-<subject>` |
/// | not yet known | `[<prefix>-]<suggested>` |
///
/// # Examples
///
/// ```
/// use tokencache::{AccountId, PartitionKeyScheme};
///
/// let keys = PartitionKeyScheme::new();
/// assert_eq!(keys.app_key("clientA").as_str(), "App-clientA");
///
/// let keys = PartitionKeyScheme::with_prefix("contoso");
/// let account = AccountId::new("tenantT", "subjectS");
/// assert_eq!(keys.user_key(&account).as_str(), "contoso-User-tenantT-subjectS");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionKeyScheme {
    prefix: Option<String>,
}

impl PartitionKeyScheme {
    /// Creates a scheme without a prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheme that prefixes every key with `prefix`.
    ///
    /// An empty prefix is the same as no prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: (!prefix.is_empty()).then_some(prefix),
        }
    }

    /// Returns the configured prefix.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the key of the application partition for `client_id`.
    #[must_use]
    pub fn app_key(&self, client_id: &str) -> PartitionKey {
        self.compose(format_args!("App-{client_id}"))
    }

    /// Returns the key of the partition holding `account`'s tokens.
    #[must_use]
    pub fn user_key(&self, account: &AccountId) -> PartitionKey {
        self.compose(format_args!("User-{account}"))
    }

    /// Returns a temporary key for a round-trip made before the account is known.
    ///
    /// The token library supplies `suggested`, typically derived from a correlation
    /// identifier. Moving state from the temporary key to the account key once the
    /// account is known is the library's concern.
    #[must_use]
    pub fn suggested_key(&self, suggested: &str) -> PartitionKey {
        self.compose(format_args!("{suggested}"))
    }

    /// Returns the account key when the account is known and the temporary key otherwise.
    #[must_use]
    pub fn user_key_or_suggested(&self, account: Option<&AccountId>, suggested: &str) -> PartitionKey {
        account.map_or_else(|| self.suggested_key(suggested), |account| self.user_key(account))
    }

    fn compose(&self, body: fmt::Arguments<'_>) -> PartitionKey {
        match &self.prefix {
            Some(prefix) => PartitionKey::from(format!("{prefix}-{body}")),
            None => PartitionKey::from(body.to_string()),
        }
    }
}
