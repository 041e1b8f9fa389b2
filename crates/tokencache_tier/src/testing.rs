// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock backend for testing.
//!
//! [`MockBackend`] keeps partitions in memory, records every operation and can be
//! told to fail selected operations, which makes it a stand-in for an unreliable
//! shared store.

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use parking_lot::Mutex;
use recoverable::RecoveryInfo;

use crate::{CacheBackend, CacheBlob, CacheHints, Error, PartitionKey, Result};

/// A recorded backend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOp {
    /// A read of the given key.
    Get(PartitionKey),
    /// A write of the given key.
    Set {
        /// The key that was written.
        key: PartitionKey,
        /// The blob that was written.
        blob: CacheBlob,
        /// The suggested expiry carried by the write's hints.
        suggested_expiry: Option<SystemTime>,
    },
    /// A removal of the given key.
    Delete(PartitionKey),
}

impl BackendOp {
    /// Returns the key the operation targeted.
    #[must_use]
    pub fn key(&self) -> &PartitionKey {
        match self {
            Self::Get(key) | Self::Delete(key) | Self::Set { key, .. } => key,
        }
    }
}

type FailPredicate = Box<dyn Fn(&BackendOp) -> bool + Send + Sync>;

struct FailureRule {
    predicate: FailPredicate,
    recovery: RecoveryInfo,
}

/// A configurable in-memory backend for tests.
///
/// Clones share the same storage, operation log and failure rule, so a test can keep
/// one handle for assertions while handing another to the code under test.
///
/// # Examples
///
/// ```ignore
/// use tokencache_tier::testing::{BackendOp, MockBackend};
/// use tokencache_tier::{CacheBackend, CacheBlob, CacheHints, PartitionKey};
///
/// # futures::executor::block_on(async {
/// let backend = MockBackend::new();
/// let key = PartitionKey::from("App-clientA");
///
/// backend.fail_when(|op| matches!(op, BackendOp::Get(_)));
/// assert!(backend.get(&key, &mut CacheHints::new()).await.is_err());
///
/// backend.clear_failures();
/// backend.set(&key, CacheBlob::from_static(b"state"), &CacheHints::new()).await.unwrap();
/// assert!(backend.contains_key(&key));
/// # });
/// ```
#[derive(Clone)]
pub struct MockBackend {
    data: Arc<Mutex<HashMap<PartitionKey, CacheBlob>>>,
    operations: Arc<Mutex<Vec<BackendOp>>>,
    failure: Arc<Mutex<Option<FailureRule>>>,
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.failure.lock().is_some())
            .finish()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Creates an empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(HashMap::new())
    }

    /// Creates a mock backend holding the given partitions.
    #[must_use]
    pub fn with_data(data: HashMap<PartitionKey, CacheBlob>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of stored partitions.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns `true` if a blob is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &PartitionKey) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Returns the blob stored under `key` without recording an operation.
    #[must_use]
    pub fn blob(&self, key: &PartitionKey) -> Option<CacheBlob> {
        self.data.lock().get(key).cloned()
    }

    /// Fails every operation matching `predicate` with a retryable error.
    ///
    /// Replaces any previous rule. Failed operations are still recorded.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&BackendOp) -> bool + Send + Sync + 'static,
    {
        self.fail_when_with(RecoveryInfo::retry(), predicate);
    }

    /// Fails every operation matching `predicate` with an error carrying `recovery`.
    pub fn fail_when_with<F>(&self, recovery: RecoveryInfo, predicate: F)
    where
        F: Fn(&BackendOp) -> bool + Send + Sync + 'static,
    {
        *self.failure.lock() = Some(FailureRule {
            predicate: Box::new(predicate),
            recovery,
        });
    }

    /// Removes the failure rule so all operations succeed.
    pub fn clear_failures(&self) {
        *self.failure.lock() = None;
    }

    /// Returns a copy of every recorded operation, oldest first.
    #[must_use]
    pub fn operations(&self) -> Vec<BackendOp> {
        self.operations.lock().clone()
    }

    /// Returns how many recorded operations match `predicate`.
    #[must_use]
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&BackendOp) -> bool,
    {
        self.operations.lock().iter().filter(|op| predicate(op)).count()
    }

    /// Forgets all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn check(&self, op: BackendOp, message: &'static str) -> Result<()> {
        let error = self
            .failure
            .lock()
            .as_ref()
            .filter(|rule| (rule.predicate)(&op))
            .map(|rule| Error::with_recovery(rule.recovery.clone(), message));
        self.operations.lock().push(op);
        error.map_or(Ok(()), Err)
    }
}

impl CacheBackend for MockBackend {
    async fn get(&self, key: &PartitionKey, _hints: &mut CacheHints) -> Result<Option<CacheBlob>> {
        self.check(BackendOp::Get(key.clone()), "mock: get failed")?;
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &PartitionKey, blob: CacheBlob, hints: &CacheHints) -> Result<()> {
        let op = BackendOp::Set {
            key: key.clone(),
            blob: blob.clone(),
            suggested_expiry: hints.suggested_expiry(),
        };
        self.check(op, "mock: set failed")?;
        self.data.lock().insert(key.clone(), blob);
        Ok(())
    }

    async fn delete(&self, key: &PartitionKey) -> Result<()> {
        self.check(BackendOp::Delete(key.clone()), "mock: delete failed")?;
        self.data.lock().remove(key);
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.data.lock().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use recoverable::{Recovery, RecoveryKind};

    use super::*;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn failed_operations_are_recorded() {
        block_on(async {
            let mock = MockBackend::new();
            let key = PartitionKey::from("k");
            mock.fail_when(|op| matches!(op, BackendOp::Get(_)));

            let error = mock.get(&key, &mut CacheHints::new()).await.expect_err("get should fail");

            assert_eq!(error.recovery().kind(), RecoveryKind::Retry);
            assert_eq!(mock.operations(), vec![BackendOp::Get(key)]);
        });
    }

    #[test]
    fn failing_set_leaves_data_untouched() {
        block_on(async {
            let mock = MockBackend::new();
            let key = PartitionKey::from("k");
            mock.fail_when_with(RecoveryInfo::never(), |op| matches!(op, BackendOp::Set { .. }));

            let error = mock
                .set(&key, CacheBlob::from_static(b"x"), &CacheHints::new())
                .await
                .expect_err("set should fail");

            assert_eq!(error.recovery().kind(), RecoveryKind::Never);
            assert!(!mock.contains_key(&key));
        });
    }

    #[test]
    fn count_filters_operations() {
        block_on(async {
            let mock = MockBackend::new();
            let key = PartitionKey::from("k");
            let _ = mock.get(&key, &mut CacheHints::new()).await;
            let _ = mock.get(&key, &mut CacheHints::new()).await;
            mock.delete(&key).await.expect("delete failed");

            assert_eq!(mock.count(|op| matches!(op, BackendOp::Get(_))), 2);
            assert_eq!(mock.count(|op| op.key() == &key), 3);

            mock.clear_operations();
            assert!(mock.operations().is_empty());
        });
    }
}
