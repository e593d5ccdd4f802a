//! Bunny Fonts, a privacy-friendly mirror of the Google Fonts catalogue.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use unifont_cache::{CacheKeyFactory, CachedStorage};
use unifont_core::{
    FaceDescriptor, InitializedProvider, ListFonts, Provider, ProviderContext, ResolveFont,
    ResolveFontResult, ResolveOptions, prepare_weights,
};
use unifont_css::clean_faces;

use crate::common::{data_key, faces_by_subset};
use crate::fetch::Fetcher;

pub const PROVIDER_NAME: &str = "bunny";

const API_BASE_URL: &str = "https://fonts.bunny.net";

/// One entry of the `/list` catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BunnyFontMeta {
    family_name: String,
    #[serde(default)]
    weights: Vec<u32>,
}

/// The Bunny Fonts provider.
#[derive(Debug, Clone)]
pub struct BunnyProvider {
    base_url: String,
}

impl Default for BunnyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BunnyProvider {
    pub fn new() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Override the API origin.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl Provider for BunnyProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn init(&self, ctx: ProviderContext) -> anyhow::Result<Option<InitializedProvider>> {
        let api = Fetcher::with_base_url(self.base_url.clone());
        let catalogue: BTreeMap<String, BunnyFontMeta> = {
            let api = &api;
            ctx.storage
                .get_or_init(&ctx.cache_key.key("meta.json"), move || api.get("/list").json())
                .await?
        };

        // Family name to catalogue id.
        let families: Vec<(String, String)> = catalogue
            .iter()
            .map(|(id, meta)| (meta.family_name.clone(), id.clone()))
            .collect();
        log::debug!("bunny: {} families in catalogue", families.len());

        Ok(Some(InitializedProvider::with_list_fonts(Bunny {
            catalogue,
            families,
            api,
            storage: ctx.storage,
            keys: ctx.cache_key,
        })))
    }
}

struct Bunny {
    catalogue: BTreeMap<String, BunnyFontMeta>,
    families: Vec<(String, String)>,
    api: Fetcher,
    storage: CachedStorage,
    keys: CacheKeyFactory,
}

impl Bunny {
    async fn font_details(
        &self,
        id: &str,
        font: &BunnyFontMeta,
        options: &ResolveOptions,
    ) -> anyhow::Result<Vec<FaceDescriptor>> {
        let Some(variants) = variants(font, options) else {
            return Ok(Vec::new());
        };
        let css = self
            .api
            .get("/css")
            .query("family", format!("{id}:{}", variants.join(",")))
            .text()
            .await?;
        Ok(clean_faces(faces_by_subset(&css, options, None), &options.formats))
    }
}

/// `<weight>` and `<weight>i` variants for every available requested weight
/// and style, or `None` when nothing matches.
pub(crate) fn variants(font: &BunnyFontMeta, options: &ResolveOptions) -> Option<Vec<String>> {
    let available: Vec<String> = font.weights.iter().map(u32::to_string).collect();
    let weights = prepare_weights(&options.weights, &available, false);

    let mut suffixes: Vec<&str> = Vec::new();
    for style in &options.styles {
        let suffix = if style.is_slanted() { "i" } else { "" };
        if !suffixes.contains(&suffix) {
            suffixes.push(suffix);
        }
    }
    if weights.is_empty() || suffixes.is_empty() {
        return None;
    }

    Some(
        weights
            .iter()
            .flat_map(|w| suffixes.iter().map(move |s| format!("{}{s}", w.weight)))
            .collect(),
    )
}

#[async_trait]
impl ResolveFont for Bunny {
    async fn resolve_font(
        &self,
        family: &str,
        options: &ResolveOptions,
    ) -> anyhow::Result<Option<ResolveFontResult>> {
        let Some((id, font)) = self
            .families
            .iter()
            .find(|(name, _)| name == family)
            .and_then(|(_, id)| self.catalogue.get_key_value(id))
        else {
            return Ok(None);
        };
        let fonts = self
            .storage
            .get_or_init(&data_key(&self.keys, family, options), move || {
                self.font_details(id, font, options)
            })
            .await?;
        Ok(Some(ResolveFontResult::new(fonts)))
    }
}

#[async_trait]
impl ListFonts for Bunny {
    async fn list_fonts(&self) -> anyhow::Result<Option<Vec<String>>> {
        Ok(Some(self.families.iter().map(|(name, _)| name.clone()).collect()))
    }
}
