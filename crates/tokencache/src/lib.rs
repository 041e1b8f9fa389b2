// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Persistence for serialized authentication-token caches.
//!
//! A token acquisition library keeps its tokens in memory and, around each use, asks
//! this crate to load and store the serialized state of one partition: the tokens of
//! one application or of one account. This crate provides:
//!
//! - [`TokenCacheProvider`], which answers the library's before-access and after-access
//!   notifications ([`TokenCacheNotifications`]).
//! - [`TieredBackend`], a process-local tier in front of a shared tier that keeps working
//!   while the shared tier is down, governed by a [`SharedFailurePolicy`].
//! - [`PartitionKeyScheme`], which derives stable keys from application and account identity.
//! - [`TokenCacheOptions`], validated when the provider is built.
//! - [`BlobProtector`] for protecting blobs at rest.
//!
//! Storage itself is abstracted by [`CacheBackend`](tokencache_tier::CacheBackend); the
//! in-process implementation lives in `tokencache_memory`.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use tick::Clock;
//! use tokencache::{AccessOutcome, AccountId, TokenCacheNotifications, TokenCacheOptions, TokenCacheProvider};
//! use tokencache_memory::MemoryBackend;
//! use tokencache_tier::{CacheBlob, CacheHints, CacheLevel};
//!
//! # futures::executor::block_on(async {
//! let clock = Clock::new_frozen();
//! let shared = MemoryBackend::new(clock.clone());
//! let provider = TokenCacheProvider::builder(clock.clone())
//!     .options(TokenCacheOptions::default().with_key_prefix("contoso"))
//!     .distributed(shared)?;
//!
//! let account = AccountId::new("tenantT", "subjectS");
//! let key = provider.keys().user_key(&account);
//! let hints = CacheHints::new().with_suggested_expiry(clock.system_time() + Duration::from_secs(300));
//!
//! provider
//!     .on_after_access(&key, AccessOutcome::Updated(CacheBlob::from_static(b"state")), &hints)
//!     .await?;
//!
//! let mut hints = CacheHints::new();
//! let blob = provider.on_before_access(&key, &mut hints).await?;
//! assert_eq!(blob.as_deref(), Some(&b"state"[..]));
//! assert_eq!(hints.telemetry().cache_level(), CacheLevel::L1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```
//!
//! # Features
//!
//! - `metrics`: OpenTelemetry metrics through [`CacheTelemetry::with_meter_provider`].
//! - `redis`: [`RedisBackend`], a shared tier stored in Redis.
//! - `encryption`: [`AesGcmProtector`], AES-256-GCM protection of blobs at rest.
//! - `dynamic`: `DynamicBackend` for choosing the shared tier at runtime.
//! - `test-util`: the mock backend and controllable clock.

mod error;
mod failure;
mod keys;
mod options;
mod protect;
mod provider;
#[cfg(feature = "redis")]
mod redis;
mod sync;
mod telemetry;
mod tiered;

#[doc(inline)]
pub use error::ConfigError;
#[doc(inline)]
pub use failure::SharedFailurePolicy;
#[doc(inline)]
pub use keys::{AccountId, PartitionKeyScheme};
#[doc(inline)]
pub use options::{DEFAULT_LOCAL_TIER_SIZE_LIMIT, TokenCacheOptions};
#[cfg(feature = "encryption")]
#[doc(inline)]
pub use protect::AesGcmProtector;
#[doc(inline)]
pub use protect::BlobProtector;
#[doc(inline)]
pub use provider::{TokenCacheProvider, TokenCacheProviderBuilder};
#[cfg(feature = "redis")]
#[doc(inline)]
pub use redis::RedisBackend;
#[doc(inline)]
pub use sync::{AccessOutcome, TokenCacheNotifications};
#[doc(inline)]
pub use telemetry::CacheTelemetry;
#[doc(inline)]
pub use tiered::TieredBackend;
