//! The provider contract.
//!
//! A [`Provider`] is a named factory. Initializing it against a
//! [`ProviderContext`] yields an [`InitializedProvider`] carrying the
//! capabilities it supports, or `None` when the provider opts out (missing
//! credentials, nothing to serve).

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unifont_cache::{CacheKeyFactory, CachedStorage};

use crate::face::FaceDescriptor;
use crate::options::ResolveOptions;

/// Faces found for a family, tagged with the provider that produced them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolveFontResult {
    pub fonts: Vec<FaceDescriptor>,
    /// Set by the orchestrator, never by providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ResolveFontResult {
    pub fn new(fonts: Vec<FaceDescriptor>) -> Self {
        Self {
            fonts,
            provider: None,
        }
    }
}

/// Resolve a family into face descriptors.
///
/// `Ok(None)` means the provider does not know the family; `Ok(Some)` with
/// an empty list means it knows it but nothing matched the options.
#[async_trait]
pub trait ResolveFont: Send + Sync {
    async fn resolve_font(
        &self,
        family: &str,
        options: &ResolveOptions,
    ) -> anyhow::Result<Option<ResolveFontResult>>;
}

/// Enumerate the family names a provider can serve.
#[async_trait]
pub trait ListFonts: Send + Sync {
    async fn list_fonts(&self) -> anyhow::Result<Option<Vec<String>>>;
}

/// Capabilities of a provider after a successful `init`.
#[derive(Clone)]
pub struct InitializedProvider {
    resolver: Arc<dyn ResolveFont>,
    lister: Option<Arc<dyn ListFonts>>,
}

impl fmt::Debug for InitializedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializedProvider")
            .field("can_list_fonts", &self.can_list_fonts())
            .finish()
    }
}

impl InitializedProvider {
    /// A provider that can only resolve families.
    pub fn new<P: ResolveFont + 'static>(provider: P) -> Self {
        Self {
            resolver: Arc::new(provider),
            lister: None,
        }
    }

    /// A provider that can resolve and list families.
    pub fn with_list_fonts<P>(provider: P) -> Self
    where
        P: ResolveFont + ListFonts + 'static,
    {
        let shared = Arc::new(provider);
        Self {
            resolver: shared.clone(),
            lister: Some(shared),
        }
    }

    /// Build from already shared capability objects.
    pub fn from_parts(resolver: Arc<dyn ResolveFont>, lister: Option<Arc<dyn ListFonts>>) -> Self {
        Self { resolver, lister }
    }

    pub fn resolver(&self) -> &dyn ResolveFont {
        self.resolver.as_ref()
    }

    pub fn lister(&self) -> Option<&dyn ListFonts> {
        self.lister.as_deref()
    }

    pub fn can_list_fonts(&self) -> bool {
        self.lister.is_some()
    }
}

/// What a provider receives at initialization.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    /// Storage namespaced to this provider and its options.
    pub storage: CachedStorage,
    /// Key builder bound to this provider and its options.
    pub cache_key: CacheKeyFactory,
}

/// A named provider factory.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier (`google`, `bunny`, ...).
    fn name(&self) -> &str;

    /// Options fingerprinted into this provider's cache namespace.
    fn options(&self) -> Value {
        Value::Null
    }

    /// Finish setting up. `Ok(None)` opts the provider out.
    async fn init(&self, ctx: ProviderContext) -> anyhow::Result<Option<InitializedProvider>>;
}

/// A [`Provider`] built from a closure by [`define_provider`].
pub struct FnProvider<F> {
    name: String,
    options: Value,
    init: F,
}

impl<F> fmt::Debug for FnProvider<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProvider")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> Provider for FnProvider<F>
where
    F: Fn(ProviderContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<InitializedProvider>>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> Value {
        self.options.clone()
    }

    async fn init(&self, ctx: ProviderContext) -> anyhow::Result<Option<InitializedProvider>> {
        (self.init)(ctx).await
    }
}

/// Define a provider from a name, its options and an init closure.
///
/// Options that fail to serialize fingerprint as `null`.
pub fn define_provider<O, F, Fut>(name: impl Into<String>, options: &O, init: F) -> FnProvider<F>
where
    O: Serialize + ?Sized,
    F: Fn(ProviderContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<InitializedProvider>>> + Send + 'static,
{
    FnProvider {
        name: name.into(),
        options: serde_json::to_value(options).unwrap_or(Value::Null),
        init,
    }
}
