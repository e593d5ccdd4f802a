//! Orchestrator configuration.

use std::fmt;
use std::sync::Arc;

use unifont_cache::{CacheConfig, Storage};

use crate::VERSION;
use crate::error::ErrorPolicy;

/// Options for [`Unifont::new`](crate::Unifont::new).
///
/// ```rust
/// use std::sync::Arc;
/// use unifont::{ErrorPolicy, FsStorage, UnifontOptions};
///
/// let options = UnifontOptions::default()
///     .with_storage(Arc::new(FsStorage::new("/tmp/unifont-cache")))
///     .with_error_policy(ErrorPolicy::Propagate);
/// assert_eq!(options.error_policy, ErrorPolicy::Propagate);
/// ```
#[derive(Clone)]
pub struct UnifontOptions {
    /// Raw backend shared by every provider. A fresh in-memory store when
    /// unset.
    pub storage: Option<Arc<dyn Storage>>,
    pub error_policy: ErrorPolicy,
    /// TTL and schema version of cache entries. The schema version defaults
    /// to this crate's version.
    pub cache: CacheConfig,
}

impl Default for UnifontOptions {
    fn default() -> Self {
        Self {
            storage: None,
            error_policy: ErrorPolicy::default(),
            cache: CacheConfig::for_version(VERSION),
        }
    }
}

impl fmt::Debug for UnifontOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnifontOptions")
            .field("storage", &self.storage.as_ref().map(|_| "<custom>"))
            .field("error_policy", &self.error_policy)
            .field("cache", &self.cache)
            .finish()
    }
}

impl UnifontOptions {
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Shorthand for [`ErrorPolicy::Propagate`] (`true`) or
    /// [`ErrorPolicy::Log`] (`false`).
    pub fn throw_on_error(self, throw: bool) -> Self {
        self.with_error_policy(if throw { ErrorPolicy::Propagate } else { ErrorPolicy::Log })
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}
