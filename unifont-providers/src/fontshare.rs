//! Fontshare.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use unifont_cache::{CacheKeyFactory, CachedStorage};
use unifont_core::{
    FaceDescriptor, FontStyle, InitializedProvider, Provider, ProviderContext, ResolveFont,
    ResolveFontResult, ResolveOptions,
};
use unifont_css::extract_faces;

use crate::common::data_key;
use crate::fetch::Fetcher;

pub const PROVIDER_NAME: &str = "fontshare";

const API_BASE_URL: &str = "https://api.fontshare.com/v2";

/// Catalogue page size.
const PAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct FontPage {
    #[serde(default)]
    fonts: Vec<FontshareFontMeta>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FontshareFontMeta {
    slug: String,
    name: String,
    #[serde(default)]
    styles: Vec<FontshareStyle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FontshareStyle {
    #[serde(default)]
    is_italic: bool,
    weight: FontshareWeight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FontshareWeight {
    /// Identifier used in CSS requests.
    number: u32,
    /// CSS weight (`400`, `700`, ...).
    weight: u32,
}

/// The Fontshare provider.
#[derive(Debug, Clone)]
pub struct FontshareProvider {
    base_url: String,
}

impl Default for FontshareProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FontshareProvider {
    pub fn new() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Override the API root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

async fn fetch_catalogue(api: &Fetcher) -> anyhow::Result<Vec<FontshareFontMeta>> {
    let mut fonts = Vec::new();
    let mut offset = 0u32;
    loop {
        let page: FontPage = api
            .get("/fonts")
            .query("offset", offset)
            .query("limit", PAGE_LIMIT)
            .json()
            .await?;
        fonts.extend(page.fonts);
        if !page.has_more {
            return Ok(fonts);
        }
        offset += 1;
    }
}

#[async_trait]
impl Provider for FontshareProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn init(&self, ctx: ProviderContext) -> anyhow::Result<Option<InitializedProvider>> {
        let api = Fetcher::with_base_url(self.base_url.clone());
        let fonts: Vec<FontshareFontMeta> = {
            let api = &api;
            ctx.storage
                .get_or_init(&ctx.cache_key.key("meta.json"), move || fetch_catalogue(api))
                .await?
        };
        log::debug!("fontshare: {} families in catalogue", fonts.len());

        Ok(Some(InitializedProvider::new(Fontshare {
            fonts,
            api,
            storage: ctx.storage,
            keys: ctx.cache_key,
        })))
    }
}

struct Fontshare {
    fonts: Vec<FontshareFontMeta>,
    api: Fetcher,
    storage: CachedStorage,
    keys: CacheKeyFactory,
}

/// Style numbers of every declared style matching the requested styles and
/// weights.
pub(crate) fn matching_numbers(font: &FontshareFontMeta, options: &ResolveOptions) -> Vec<u32> {
    font.styles
        .iter()
        .filter(|style| {
            let wanted = if style.is_italic { FontStyle::Italic } else { FontStyle::Normal };
            options.wants_style(wanted)
        })
        .filter(|style| {
            let weight = style.weight.weight.to_string();
            options.weights.iter().any(|w| *w == weight)
        })
        .map(|style| style.weight.number)
        .collect()
}

impl Fontshare {
    async fn font_details(
        &self,
        font: &FontshareFontMeta,
        options: &ResolveOptions,
    ) -> anyhow::Result<Vec<FaceDescriptor>> {
        let numbers = matching_numbers(font, options);
        if numbers.is_empty() {
            return Ok(Vec::new());
        }
        let numbers: Vec<String> = numbers.iter().map(u32::to_string).collect();
        let css = self
            .api
            .get("/css")
            .query("f[]", format!("{}@{}", font.slug, numbers.join(",")))
            .text()
            .await?;
        // TODO: filter by subset once the API annotates its CSS with subsets.
        Ok(extract_faces(&css, None))
    }
}

#[async_trait]
impl ResolveFont for Fontshare {
    async fn resolve_font(
        &self,
        family: &str,
        options: &ResolveOptions,
    ) -> anyhow::Result<Option<ResolveFontResult>> {
        let Some(font) = self.fonts.iter().find(|f| f.name == family) else {
            return Ok(None);
        };
        let fonts = self
            .storage
            .get_or_init(&data_key(&self.keys, family, options), move || {
                self.font_details(font, options)
            })
            .await?;
        Ok(Some(ResolveFontResult::new(fonts)))
    }
}
