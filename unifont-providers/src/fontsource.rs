//! Fontsource.
//!
//! Unlike the CSS-serving providers, Fontsource describes every file in JSON,
//! so faces are assembled directly from the family detail: one face per
//! subset, style and static weight, plus one variable `wght` face per subset
//! and style when a weight range is requested.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use unifont_cache::{CacheKeyFactory, CachedStorage};
use unifont_core::{
    FaceDescriptor, FaceMeta, FontSource, FontWeight, InitializedProvider, ListFonts, Provider,
    ProviderContext, ResolveFont, ResolveFontResult, ResolveOptions, filter_subsets,
    prepare_weights,
};

use crate::common::data_key;
use crate::fetch::Fetcher;

pub const PROVIDER_NAME: &str = "fontsource";

const API_BASE_URL: &str = "https://api.fontsource.org/v1";
const CDN_BASE_URL: &str = "https://cdn.jsdelivr.net/fontsource/fonts";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FontsourceFontMeta {
    id: String,
    family: String,
    #[serde(default)]
    subsets: Vec<String>,
    #[serde(default)]
    weights: Vec<u32>,
    #[serde(default)]
    styles: Vec<String>,
    #[serde(default)]
    variable: bool,
}

/// Format (`woff2`, `woff`, `ttf`) to file URL.
type VariantFiles = BTreeMap<String, String>;

#[derive(Debug, Clone, Deserialize)]
struct VariantFile {
    #[serde(default)]
    url: VariantFiles,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FontsourceFontDetail {
    /// Subset to comma-separated unicode ranges.
    #[serde(default)]
    unicode_range: BTreeMap<String, String>,
    /// weight -> style -> subset -> files.
    #[serde(default)]
    variants: BTreeMap<String, BTreeMap<String, BTreeMap<String, VariantFile>>>,
}

impl FontsourceFontDetail {
    fn files(&self, weight: &str, style: &str, subset: &str) -> Option<&VariantFiles> {
        self.variants
            .get(weight)?
            .get(style)?
            .get(subset)
            .map(|file| &file.url)
    }

    fn unicode_range(&self, subset: &str) -> Option<Vec<String>> {
        self.unicode_range
            .get(subset)
            .map(|ranges| ranges.split(',').map(|r| r.trim().to_string()).collect())
    }
}

/// Axis bounds arrive either as strings or as numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AxisBound {
    Number(f64),
    Text(String),
}

impl AxisBound {
    fn value(&self) -> Option<f64> {
        match self {
            AxisBound::Number(n) => Some(*n),
            AxisBound::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VariableAxis {
    min: AxisBound,
    max: AxisBound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct VariableFontDetail {
    #[serde(default)]
    axes: BTreeMap<String, VariableAxis>,
}

impl VariableFontDetail {
    fn weight_range(&self) -> Option<FontWeight> {
        let axis = self.axes.get("wght")?;
        Some(FontWeight::Range(axis.min.value()?, axis.max.value()?))
    }
}

/// The Fontsource provider.
#[derive(Debug, Clone)]
pub struct FontsourceProvider {
    base_url: String,
    cdn_base_url: String,
}

impl Default for FontsourceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FontsourceProvider {
    pub fn new() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            cdn_base_url: CDN_BASE_URL.to_string(),
        }
    }

    /// Override the API root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the CDN serving variable font files.
    pub fn with_cdn_base_url(mut self, url: impl Into<String>) -> Self {
        self.cdn_base_url = url.into();
        self
    }
}

#[async_trait]
impl Provider for FontsourceProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn init(&self, ctx: ProviderContext) -> anyhow::Result<Option<InitializedProvider>> {
        let api = Fetcher::with_base_url(self.base_url.clone());
        let fonts: Vec<FontsourceFontMeta> = {
            let api = &api;
            ctx.storage
                .get_or_init(&ctx.cache_key.key("meta.json"), move || api.get("/fonts").json())
                .await?
        };
        log::debug!("fontsource: {} families in catalogue", fonts.len());

        Ok(Some(InitializedProvider::with_list_fonts(Fontsource {
            fonts,
            api,
            cdn_base_url: self.cdn_base_url.clone(),
            storage: ctx.storage,
            keys: ctx.cache_key,
        })))
    }
}

struct Fontsource {
    fonts: Vec<FontsourceFontMeta>,
    api: Fetcher,
    cdn_base_url: String,
    storage: CachedStorage,
    keys: CacheKeyFactory,
}

impl Fontsource {
    async fn variable_axes(&self, font: &FontsourceFontMeta) -> anyhow::Result<VariableFontDetail> {
        let key = self
            .keys
            .key_with("axes.json", |parts| parts.join(&[&font.family]));
        let api = &self.api;
        let path = format!("/variable/{}", font.id);
        let path = path.as_str();
        self.storage
            .get_or_init(&key, move || api.get(path).json())
            .await
    }

    fn variable_url(&self, font: &FontsourceFontMeta, subset: &str, style: &str) -> String {
        format!(
            "{}/{}:vf@latest/{subset}-wght-{style}.woff2",
            self.cdn_base_url.trim_end_matches('/'),
            font.id
        )
    }

    async fn font_details(
        &self,
        font: &FontsourceFontMeta,
        options: &ResolveOptions,
    ) -> anyhow::Result<Vec<FaceDescriptor>> {
        let available: Vec<String> = font.weights.iter().map(u32::to_string).collect();
        let weights = prepare_weights(&options.weights, &available, font.variable);
        let styles: Vec<&str> = options
            .styles
            .iter()
            .map(|style| style.as_str())
            .filter(|style| font.styles.iter().any(|s| s == style))
            .collect();
        let subsets = filter_subsets(&options.subsets, &font.subsets);
        if weights.is_empty() || styles.is_empty() {
            return Ok(Vec::new());
        }

        let detail: FontsourceFontDetail =
            self.api.get(&format!("/fonts/{}", font.id)).json().await?;

        let mut faces = Vec::new();
        for subset in &subsets {
            for style in &styles {
                for prepared in &weights {
                    if prepared.variable {
                        let range = match self.variable_axes(font).await {
                            Ok(axes) => axes.weight_range(),
                            Err(err) => {
                                log::warn!(
                                    "Could not download variable axes metadata for `{family}` from `fontsource`. `unifont` will not be able to inject variable axes for {family}.",
                                    family = font.family
                                );
                                log::debug!("fontsource axes error: {err:#}");
                                continue;
                            }
                        };
                        if let Some(range) = range {
                            faces.push(face(
                                vec![FontSource::remote_with_format(
                                    self.variable_url(font, subset, style),
                                    "woff2",
                                )],
                                style,
                                range,
                                detail.unicode_range(subset),
                                subset,
                            ));
                        }
                        continue;
                    }

                    let Some(files) = detail.files(&prepared.weight, style, subset) else {
                        continue;
                    };
                    let src: Vec<FontSource> = options
                        .formats
                        .iter()
                        .filter_map(|format| {
                            files
                                .get(format.as_str())
                                .map(|url| FontSource::remote_with_format(url, format.css_name()))
                        })
                        .collect();
                    if src.is_empty() {
                        continue;
                    }
                    let weight = prepared
                        .weight
                        .parse()
                        .map(FontWeight::Number)
                        .unwrap_or_else(|_| FontWeight::Text(prepared.weight.clone()));
                    faces.push(face(src, style, weight, detail.unicode_range(subset), subset));
                }
            }
        }
        Ok(faces)
    }
}

fn face(
    src: Vec<FontSource>,
    style: &str,
    weight: FontWeight,
    unicode_range: Option<Vec<String>>,
    subset: &str,
) -> FaceDescriptor {
    FaceDescriptor {
        style: Some(style.to_string()),
        weight: Some(weight),
        unicode_range,
        meta: Some(FaceMeta {
            subset: Some(subset.to_string()),
            ..FaceMeta::default()
        }),
        ..FaceDescriptor::new(src)
    }
}

#[async_trait]
impl ResolveFont for Fontsource {
    async fn resolve_font(
        &self,
        family: &str,
        options: &ResolveOptions,
    ) -> anyhow::Result<Option<ResolveFontResult>> {
        let Some(font) = self.fonts.iter().find(|f| f.family == family) else {
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

#[async_trait]
impl ListFonts for Fontsource {
    async fn list_fonts(&self) -> anyhow::Result<Option<Vec<String>>> {
        Ok(Some(self.fonts.iter().map(|f| f.family.clone()).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_axis_bounds_accept_strings_and_numbers() {
        let detail: VariableFontDetail = serde_json::from_value(json!({
            "axes": { "wght": { "default": "400", "min": "100", "max": 900, "step": "1" } }
        }))
        .unwrap();
        assert_eq!(detail.weight_range(), Some(FontWeight::Range(100.0, 900.0)));

        let detail: VariableFontDetail =
            serde_json::from_value(json!({ "axes": { "wdth": { "min": 75, "max": 100 } } })).unwrap();
        assert_eq!(detail.weight_range(), None);
    }

    #[test]
    fn test_detail_lookup() {
        let detail: FontsourceFontDetail = serde_json::from_value(json!({
            "unicodeRange": { "latin": "U+0000-00FF,U+0131" },
            "variants": {
                "400": { "normal": { "latin": { "url": { "woff2": "/a.woff2", "ttf": "/a.ttf" } } } }
            }
        }))
        .unwrap();
        assert_eq!(detail.files("400", "normal", "latin").map(|f| f.len()), Some(2));
        assert!(detail.files("700", "normal", "latin").is_none());
        assert_eq!(
            detail.unicode_range("latin"),
            Some(vec!["U+0000-00FF".to_string(), "U+0131".to_string()])
        );
        assert_eq!(detail.unicode_range("greek"), None);
    }
}
