// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Storage abstractions for persisting serialized authentication token caches.
//!
//! A token cache is split into partitions, one per application or per account. Each
//! partition is persisted as a single opaque [`CacheBlob`] under a [`PartitionKey`].
//! This crate defines the [`CacheBackend`] trait that every physical store implements,
//! the [`CacheHints`] passed alongside each call, the [`ExpiryPolicy`] that turns those
//! hints into a time-to-live, and the [`Error`] type returned by fallible operations.
//!
//! # Implementing a Backend
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//!
//! use tokencache_tier::{CacheBackend, CacheBlob, CacheHints, Error, PartitionKey};
//!
//! #[derive(Default)]
//! struct HashMapBackend(Mutex<HashMap<PartitionKey, CacheBlob>>);
//!
//! impl CacheBackend for HashMapBackend {
//!     async fn get(&self, key: &PartitionKey, _hints: &mut CacheHints) -> Result<Option<CacheBlob>, Error> {
//!         Ok(self.0.lock().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &PartitionKey, blob: CacheBlob, _hints: &CacheHints) -> Result<(), Error> {
//!         self.0.lock().unwrap().insert(key.clone(), blob);
//!         Ok(())
//!     }
//!
//!     async fn delete(&self, key: &PartitionKey) -> Result<(), Error> {
//!         self.0.lock().unwrap().remove(key);
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! The `dynamic` feature (enabled by default) provides [`DynamicBackend`], a clonable
//! type-erased wrapper around any [`CacheBackend`].

mod backend;
pub mod error;
mod expiry;
mod hints;
mod partition;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[cfg(feature = "dynamic")]
mod dynamic;

#[doc(inline)]
pub use backend::CacheBackend;
#[cfg(feature = "dynamic")]
#[doc(inline)]
pub use dynamic::{DynamicBackend, DynamicBackendExt};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use expiry::{DEFAULT_ABSOLUTE_EXPIRY, ExpiryPolicy, MIN_ENTRY_TTL};
#[doc(inline)]
pub use hints::{CacheHints, CacheLevel, TelemetryRecord};
#[doc(inline)]
pub use partition::{CacheBlob, PartitionKey};
