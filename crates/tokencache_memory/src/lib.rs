// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-process token-cache backend backed by moka.
//!
//! [`MemoryBackend`] stores each partition's blob in a concurrent moka cache. Capacity is
//! a byte budget: an entry weighs as much as its key and blob. Each entry expires at the
//! time computed by its [`ExpiryPolicy`](tokencache_tier::ExpiryPolicy), measured on the
//! injected [`Clock`](tick::Clock).
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use tick::Clock;
//! use tokencache_memory::MemoryBackend;
//! use tokencache_tier::{CacheBackend, CacheBlob, CacheHints, PartitionKey};
//!
//! # futures::executor::block_on(async {
//! let backend = MemoryBackend::builder(Clock::new_frozen())
//!     .size_limit(64 * 1024 * 1024)
//!     .default_expiry(Duration::from_secs(24 * 60 * 60))
//!     .build();
//!
//! let key = PartitionKey::from("App-clientA");
//! backend.set(&key, CacheBlob::from_static(b"state"), &CacheHints::new()).await?;
//! let blob = backend.get(&key, &mut CacheHints::new()).await?;
//! assert_eq!(blob.as_deref(), Some(&b"state"[..]));
//! # Ok::<(), tokencache_tier::Error>(())
//! # });
//! ```

mod backend;
mod builder;

#[doc(inline)]
pub use backend::MemoryBackend;
#[doc(inline)]
pub use builder::MemoryBackendBuilder;
