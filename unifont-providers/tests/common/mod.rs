//! Shared helpers for the provider integration tests.
//!
//! ```ignore
//! mod common;
//! use common::{init, context};
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use unifont_cache::{CacheConfig, CacheKeyFactory, CachedStorage, MemoryStorage};
use unifont_core::{InitializedProvider, Provider, ProviderContext};

/// Context for `provider` over `backend`, namespaced the way the
/// orchestrator does it.
pub fn context(provider: &dyn Provider, backend: Arc<MemoryStorage>) -> ProviderContext {
    let cache_key = CacheKeyFactory::new(provider.name(), &provider.options());
    ProviderContext {
        storage: CachedStorage::new(backend, CacheConfig::for_version("test"))
            .with_namespace(cache_key.namespace()),
        cache_key,
    }
}

/// Initialize `provider` against fresh in-memory storage.
pub async fn init(provider: &dyn Provider) -> (InitializedProvider, Arc<MemoryStorage>) {
    let backend = Arc::new(MemoryStorage::new());
    let initialized = provider
        .init(context(provider, backend.clone()))
        .await
        .expect("provider init failed")
        .expect("provider opted out");
    (initialized, backend)
}

/// Stylesheet with one `@font-face` per subset, as Google and Bunny serve it.
pub fn subset_css(family: &str, base_url: &str) -> String {
    format!(
        "/* cyrillic */
@font-face {{
  font-family: '{family}';
  font-style: normal;
  font-weight: 400;
  src: url({base_url}/cyrillic.woff2) format('woff2');
  unicode-range: U+0301, U+0400-045F;
}}
/* latin */
@font-face {{
  font-family: '{family}';
  font-style: normal;
  font-weight: 400;
  src: url({base_url}/latin.woff2) format('woff2');
  unicode-range: U+0000-00FF, U+0131;
}}
"
    )
}
