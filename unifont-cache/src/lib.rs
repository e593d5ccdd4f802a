//! Cache keys and cached storage for unifont providers.
//!
//! This crate provides:
//! - [`CacheKeyFactory`]: deterministic, sanitized cache keys bound to a
//!   provider's name and options
//! - [`Storage`]: the raw key/value backend contract, with [`MemoryStorage`]
//!   and [`FsStorage`] implementations
//! - [`CachedStorage`]: a TTL and schema-version aware wrapper that providers
//!   use to memoize metadata and resolved faces
//!
//! # Architecture
//!
//! Every provider gets its own [`CachedStorage`] handle namespaced by
//! `<provider>:<hash(options)>`, so two providers (or one provider with two
//! configurations) never read each other's entries even when they share a
//! backend.

pub mod cache_key;
pub mod cached;
pub mod error;
pub mod storage;

pub use cache_key::{CacheKeyFactory, KeyParts, sanitize, stable_hash};
pub use cached::{CacheConfig, CacheEntry, CachedStorage, ONE_WEEK_SECS};
pub use error::CacheError;
pub use storage::{FsStorage, MemoryStorage, Storage};
