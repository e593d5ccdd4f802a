//! The provider orchestrator.
//!
//! Providers are initialized concurrently, each against storage namespaced
//! by its name and options. Resolution then walks the surviving providers
//! one at a time, in declaration order, and stops at the first provider that
//! knows the family.

use std::sync::Arc;

use futures::future::join_all;
use unifont_cache::{CacheKeyFactory, CachedStorage, MemoryStorage, Storage};
use unifont_core::{
    InitializedProvider, PartialResolveOptions, Provider, ProviderContext, ResolveFontResult,
};

use crate::error::{ErrorPolicy, UnifontError};
use crate::options::UnifontOptions;

struct ProviderEntry {
    name: String,
    provider: InitializedProvider,
}

/// An initialized provider stack.
pub struct Unifont {
    stack: Vec<ProviderEntry>,
    policy: ErrorPolicy,
}

impl std::fmt::Debug for Unifont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unifont")
            .field("providers", &self.providers())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Build an orchestrator from `providers`. See [`Unifont::new`].
pub async fn create_unifont(
    providers: Vec<Box<dyn Provider>>,
    options: UnifontOptions,
) -> Result<Unifont, UnifontError> {
    Unifont::new(providers, options).await
}

impl Unifont {
    /// Initialize every provider concurrently.
    ///
    /// Providers that opt out are dropped silently. Providers whose init
    /// fails are dropped under [`ErrorPolicy::Log`] and abort construction
    /// under [`ErrorPolicy::Propagate`]. Survivors keep their declaration
    /// order.
    pub async fn new(
        providers: Vec<Box<dyn Provider>>,
        options: UnifontOptions,
    ) -> Result<Self, UnifontError> {
        let policy = options.error_policy;
        let backend: Arc<dyn Storage> = options
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));

        let results = join_all(providers.iter().map(|provider| {
            let cache_key = CacheKeyFactory::new(provider.name(), &provider.options());
            let storage = CachedStorage::new(backend.clone(), options.cache.clone())
                .with_namespace(cache_key.namespace());
            provider.init(ProviderContext { storage, cache_key })
        }))
        .await;

        let mut stack = Vec::new();
        for (provider, result) in providers.iter().zip(results) {
            let name = provider.name().to_string();
            match result {
                Ok(Some(initialized)) => stack.push(ProviderEntry {
                    name,
                    provider: initialized,
                }),
                Ok(None) => log::debug!("provider `{name}` opted out"),
                Err(source) => policy.handle(UnifontError::ProviderInit {
                    provider: name,
                    source: source.into(),
                })?,
            }
        }

        let unifont = Self { stack, policy };
        log::debug!("unifont providers: {:?}", unifont.providers());
        Ok(unifont)
    }

    /// Names of the initialized providers, in resolution order.
    pub fn providers(&self) -> Vec<&str> {
        self.stack.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// The entries to query: all of them, or the named ones in the given
    /// order. Unknown names go through the error policy.
    fn select(&self, ids: Option<&[&str]>) -> Result<Vec<&ProviderEntry>, UnifontError> {
        let Some(ids) = ids else {
            return Ok(self.stack.iter().collect());
        };
        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            match self.stack.iter().find(|entry| entry.name == *id) {
                Some(entry) => selected.push(entry),
                None => self.policy.handle(UnifontError::UnknownProvider {
                    provider: id.to_string(),
                })?,
            }
        }
        Ok(selected)
    }

    /// Resolve `family` with the first provider that knows it.
    ///
    /// `options` are merged over the defaults. A provider answering with an
    /// empty face list still wins. When no provider answers, the result is
    /// empty and carries no provider name.
    pub async fn resolve_font(
        &self,
        family: &str,
        options: PartialResolveOptions,
        providers: Option<&[&str]>,
    ) -> Result<ResolveFontResult, UnifontError> {
        let options = options.resolve();
        for entry in self.select(providers)? {
            match entry.provider.resolver().resolve_font(family, &options).await {
                Ok(Some(mut result)) => {
                    log::debug!(
                        "`{family}` resolved by `{}` ({} faces)",
                        entry.name,
                        result.fonts.len()
                    );
                    result.provider = Some(entry.name.clone());
                    return Ok(result);
                }
                Ok(None) => {}
                Err(source) => self.policy.handle(UnifontError::ProviderResolve {
                    provider: entry.name.clone(),
                    family: family.to_string(),
                    source: source.into(),
                })?,
            }
        }
        log::debug!("`{family}` not found by any provider");
        Ok(ResolveFontResult::default())
    }

    /// Concatenate the family names of every provider able to list them.
    ///
    /// `None` when no provider returned a list; an empty list from a single
    /// provider yields `Some(vec![])`.
    pub async fn list_fonts(
        &self,
        providers: Option<&[&str]>,
    ) -> Result<Option<Vec<String>>, UnifontError> {
        let mut names: Option<Vec<String>> = None;
        for entry in self.select(providers)? {
            let Some(lister) = entry.provider.lister() else {
                continue;
            };
            match lister.list_fonts().await {
                Ok(Some(list)) => names.get_or_insert_with(Vec::new).extend(list),
                Ok(None) => {}
                Err(source) => self.policy.handle(UnifontError::ProviderList {
                    provider: entry.name.clone(),
                    source: source.into(),
                })?,
            }
        }
        Ok(names)
    }
}
