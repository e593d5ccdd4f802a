//! Material Icons and Material Symbols from Google Fonts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use unifont_cache::{CacheKeyFactory, CachedStorage};
use unifont_core::{
    FaceDescriptor, InitializedProvider, Provider, ProviderContext, ResolveFont,
    ResolveFontResult, ResolveOptions,
};
use unifont_css::extract_faces;

use crate::common::data_key;
use crate::fetch::Fetcher;

pub const PROVIDER_NAME: &str = "googleicons";

const METADATA_URL: &str = "https://fonts.google.com/metadata/icons?key=material_symbols&incomplete=true";
const CSS_BASE_URL: &str = "https://fonts.googleapis.com";

/// Full axis space of the Material Symbols families.
const SYMBOLS_AXES: &str = "opsz,wght,FILL,GRAD@20..48,100..700,0..1,-50..200";

const USER_AGENTS: [&str; 2] = [
    // woff2
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    // ttf
    "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/534.54.16 (KHTML, like Gecko) Version/5.1.4 Safari/534.54.16",
];

/// Per-request settings, passed as `options.googleicons`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleIconsFamilyOptions {
    /// Icon names to subset a Material Symbols family to.
    pub glyphs: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct IconsMetadata {
    #[serde(default)]
    families: Vec<String>,
}

/// Parse the icons metadata, whose first line is an anti-JSON-hijacking
/// prefix.
fn parse_metadata(body: &str) -> anyhow::Result<Vec<String>> {
    let json = body.split_once('\n').map_or("", |(_, rest)| rest);
    let metadata: IconsMetadata = serde_json::from_str(json)?;
    Ok(metadata.families)
}

/// The Google icon fonts provider.
#[derive(Debug, Clone)]
pub struct GoogleIconsProvider {
    metadata_url: String,
    css_base_url: String,
}

impl Default for GoogleIconsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleIconsProvider {
    pub fn new() -> Self {
        Self {
            metadata_url: METADATA_URL.to_string(),
            css_base_url: CSS_BASE_URL.to_string(),
        }
    }

    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into();
        self
    }

    pub fn with_css_base_url(mut self, url: impl Into<String>) -> Self {
        self.css_base_url = url.into();
        self
    }
}

#[async_trait]
impl Provider for GoogleIconsProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn init(&self, ctx: ProviderContext) -> anyhow::Result<Option<InitializedProvider>> {
        let fetcher = Fetcher::new();
        let families: Vec<String> = {
            let fetcher = &fetcher;
            let url = self.metadata_url.as_str();
            ctx.storage
                .get_or_init(&ctx.cache_key.key("meta.json"), move || async move {
                    parse_metadata(&fetcher.get(url).text().await?)
                })
                .await?
        };
        log::debug!("googleicons: {} icon families", families.len());

        Ok(Some(InitializedProvider::new(GoogleIcons {
            families,
            css: Fetcher::with_base_url(self.css_base_url.clone()),
            storage: ctx.storage,
            keys: ctx.cache_key,
        })))
    }
}

struct GoogleIcons {
    families: Vec<String>,
    css: Fetcher,
    storage: CachedStorage,
    keys: CacheKeyFactory,
}

impl GoogleIcons {
    async fn font_details(
        &self,
        family: &str,
        options: &ResolveOptions,
    ) -> anyhow::Result<Vec<FaceDescriptor>> {
        let family_options: GoogleIconsFamilyOptions = options
            .provider_options(PROVIDER_NAME)?
            .unwrap_or_default();
        // The API rejects unsorted icon names.
        let icon_names = family_options.glyphs.map(|mut names| {
            names.sort();
            names.join(",")
        });

        let legacy = family.contains("Icons");
        let mut css = String::new();
        if legacy {
            css += &self.css.get("/icon/css2").query("family", family).text().await?;
        }
        for user_agent in USER_AGENTS {
            let request = if legacy {
                self.css.get("/icon").query("family", family)
            } else {
                let request = self
                    .css
                    .get("/css2")
                    .query("family", format!("{family}:{SYMBOLS_AXES}"));
                match icon_names.as_deref().filter(|names| !names.is_empty()) {
                    Some(names) => request.query("icon_names", names),
                    None => request,
                }
            };
            css += &request.header("user-agent", user_agent).text().await?;
        }
        Ok(extract_faces(&css, None))
    }
}

#[async_trait]
impl ResolveFont for GoogleIcons {
    async fn resolve_font(
        &self,
        family: &str,
        options: &ResolveOptions,
    ) -> anyhow::Result<Option<ResolveFontResult>> {
        if !self.families.iter().any(|f| f == family) {
            return Ok(None);
        }
        let fonts = self
            .storage
            .get_or_init(&data_key(&self.keys, family, options), move || {
                self.font_details(family, options)
            })
            .await?;
        Ok(Some(ResolveFontResult::new(fonts)))
    }
}
