//! Typed error variants for the unifont-cache crate.
//!
//! The [`Storage`](crate::Storage) trait returns `anyhow::Result` so that
//! third-party backends can attach their own context, but the bundled
//! backends produce these structured errors so callers can downcast and
//! match on them.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the bundled storage backends.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A cache file could not be read, written or its directory created.
    #[error("Cache I/O error for '{}': {source}", path.display())]
    Io {
        /// Path of the cache file involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A cache entry could not be encoded or decoded as JSON.
    #[error("Cache entry encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}
