//! Google Fonts.
//!
//! The metadata index is fetched once per cache lifetime. Each resolution
//! builds a `css2` family query from the requested weights, styles and any
//! experimental axes, then fetches it once per requested format with a user
//! agent that makes Google serve that format.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unifont_cache::{CacheKeyFactory, CachedStorage};
use unifont_core::{
    FaceDescriptor, FontFormat, FontStyle, InitializedProvider, ListFonts, Provider,
    ProviderContext, ResolveFont, ResolveFontResult, ResolveOptions, prepare_weights,
};
use unifont_css::clean_faces;

use crate::common::{data_key, faces_by_subset};
use crate::fetch::Fetcher;

pub const PROVIDER_NAME: &str = "google";

const METADATA_URL: &str = "https://fonts.google.com/metadata/fonts";
const CSS_BASE_URL: &str = "https://fonts.googleapis.com";

/// User agent that makes the CSS API answer with `format`.
pub fn user_agent(format: FontFormat) -> Option<&'static str> {
    match format {
        FontFormat::Woff2 => Some(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
        ),
        FontFormat::Woff => {
            Some("Mozilla/5.0 (Windows NT 6.1; WOW64; rv:27.0) Gecko/20100101 Firefox/27.0")
        }
        FontFormat::Ttf => Some(
            "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_6_8; de-at) AppleWebKit/533.21.1 (KHTML, like Gecko) Version/5.0.5 Safari/533.21.1",
        ),
        FontFormat::Eot => Some("Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 6.1; Trident/4.0)"),
        FontFormat::Otf => None,
    }
}

/// One value of a variable axis: a single position or a `[min, max]` range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Range(String, String),
    Single(String),
}

impl AxisValue {
    fn to_query(&self) -> String {
        match self {
            AxisValue::Range(min, max) => format!("{min}..{max}"),
            AxisValue::Single(value) => value.clone(),
        }
    }
}

/// Axis tag (`opsz`, `wdth`, `GRAD`, ...) to requested values.
pub type VariableAxes = BTreeMap<String, Vec<AxisValue>>;

/// Provider-wide experimental settings, keyed by family name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoogleExperimental {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variable_axis: BTreeMap<String, VariableAxes>,
    /// Characters to subset each family to.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub glyphs: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleOptions {
    pub experimental: GoogleExperimental,
}

/// Per-request settings, passed as `options.google` in [`ResolveOptions`].
/// They take precedence over the provider-wide ones.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoogleFamilyExperimental {
    pub variable_axis: Option<VariableAxes>,
    pub glyphs: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleFamilyOptions {
    pub experimental: GoogleFamilyExperimental,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FontIndex {
    family_metadata_list: Vec<FontIndexMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FontIndexMeta {
    family: String,
    #[serde(default)]
    subsets: Vec<String>,
    /// Variant name (`400`, `700i`, ...) to its metrics.
    #[serde(default)]
    fonts: BTreeMap<String, Value>,
    #[serde(default)]
    axes: Vec<FontAxis>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FontAxis {
    tag: String,
    #[serde(default)]
    min: f64,
    #[serde(default)]
    max: f64,
}

/// The Google Fonts provider.
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    options: GoogleOptions,
    metadata_url: String,
    css_base_url: String,
}

impl Default for GoogleProvider {
    fn default() -> Self {
        Self::new(GoogleOptions::default())
    }
}

impl GoogleProvider {
    pub fn new(options: GoogleOptions) -> Self {
        Self {
            options,
            metadata_url: METADATA_URL.to_string(),
            css_base_url: CSS_BASE_URL.to_string(),
        }
    }

    /// Override the metadata index location.
    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into();
        self
    }

    /// Override the CSS API origin.
    pub fn with_css_base_url(mut self, url: impl Into<String>) -> Self {
        self.css_base_url = url.into();
        self
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn options(&self) -> Value {
        serde_json::to_value(&self.options).unwrap_or(Value::Null)
    }

    async fn init(&self, ctx: ProviderContext) -> anyhow::Result<Option<InitializedProvider>> {
        let fetcher = Fetcher::new();
        let families: Vec<FontIndexMeta> = {
            let fetcher = &fetcher;
            let url = self.metadata_url.as_str();
            ctx.storage
                .get_or_init(&ctx.cache_key.key("meta.json"), move || async move {
                    let index: FontIndex = fetcher.get(url).json().await?;
                    Ok::<_, anyhow::Error>(index.family_metadata_list)
                })
                .await?
        };
        log::debug!("google: {} families in metadata index", families.len());

        Ok(Some(InitializedProvider::with_list_fonts(Google {
            families,
            options: self.options.clone(),
            css: Fetcher::with_base_url(self.css_base_url.clone()),
            storage: ctx.storage,
            keys: ctx.cache_key,
        })))
    }
}

struct Google {
    families: Vec<FontIndexMeta>,
    options: GoogleOptions,
    css: Fetcher,
    storage: CachedStorage,
    keys: CacheKeyFactory,
}

/// A `css2` query ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FamilyQuery {
    /// `Family:axis,axis@v,v;v,v`.
    family: String,
    /// Joined glyphs for the `text` parameter.
    text: Option<String>,
}

impl Google {
    async fn font_details(
        &self,
        font: &FontIndexMeta,
        options: &ResolveOptions,
    ) -> anyhow::Result<Vec<FaceDescriptor>> {
        let family_options: GoogleFamilyOptions = options
            .provider_options(PROVIDER_NAME)?
            .unwrap_or_default();
        let Some(query) = family_query(font, options, &self.options, family_options) else {
            return Ok(Vec::new());
        };

        let mut faces = Vec::new();
        let mut priority = 0;
        for format in &options.formats {
            let Some(user_agent) = user_agent(*format) else {
                continue;
            };
            let mut request = self
                .css
                .get("/css2")
                .header("user-agent", user_agent)
                .query("family", &query.family);
            if let Some(text) = &query.text {
                request = request.query("text", text);
            }
            let css = request.text().await?;
            faces.extend(faces_by_subset(&css, options, Some(priority)));
            priority += 1;
        }

        Ok(clean_faces(faces, &options.formats))
    }
}

#[async_trait]
impl ResolveFont for Google {
    async fn resolve_font(
        &self,
        family: &str,
        options: &ResolveOptions,
    ) -> anyhow::Result<Option<ResolveFontResult>> {
        let Some(font) = self.families.iter().find(|f| f.family == family) else {
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
impl ListFonts for Google {
    async fn list_fonts(&self) -> anyhow::Result<Option<Vec<String>>> {
        Ok(Some(self.families.iter().map(|f| f.family.clone()).collect()))
    }
}

fn ital_value(style: FontStyle) -> &'static str {
    if style.is_slanted() { "1" } else { "0" }
}

/// Lowercase (registered) axes first, then alphabetical.
fn google_axis_order(a: &str, b: &str) -> Ordering {
    let registered = |tag: &str| tag.chars().next().is_none_or(|c| !c.is_uppercase());
    registered(b)
        .cmp(&registered(a))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Build the `css2` query for `font`, or `None` when no requested weight or
/// style is available.
pub(crate) fn family_query(
    font: &FontIndexMeta,
    options: &ResolveOptions,
    provider: &GoogleOptions,
    family: GoogleFamilyOptions,
) -> Option<FamilyQuery> {
    let mut styles: Vec<&str> = options.styles.iter().map(|s| ital_value(*s)).collect();
    styles.sort_unstable();
    styles.dedup();

    let provider_weights: Vec<&str> = font.fonts.keys().map(String::as_str).collect();
    let has_weight_axis = font.axes.iter().any(|axis| axis.tag == "wght");
    let weights: Vec<String> = prepare_weights(&options.weights, &provider_weights, has_weight_axis)
        .into_iter()
        .map(|w| if w.variable { w.weight.replacen(' ', "..", 1) } else { w.weight })
        .collect();
    if weights.is_empty() || styles.is_empty() {
        return None;
    }

    let text = family
        .experimental
        .glyphs
        .or_else(|| provider.experimental.glyphs.get(&font.family).cloned())
        .map(|glyphs| glyphs.concat())
        .filter(|text| !text.is_empty());
    let variable_axis = family
        .experimental
        .variable_axis
        .or_else(|| provider.experimental.variable_axis.get(&font.family).cloned())
        .unwrap_or_default();

    let mut axes: Vec<&str> = ["wght", "ital"]
        .into_iter()
        .chain(variable_axis.keys().map(String::as_str))
        .collect();
    axes.sort_by(|a, b| google_axis_order(a, b));
    axes.dedup();

    let mut variants: Vec<String> = Vec::new();
    for axis in &axes {
        let values: Vec<String> = match *axis {
            "wght" => weights.clone(),
            "ital" => styles.iter().map(|s| s.to_string()).collect(),
            custom => variable_axis
                .get(custom)
                .map(|values| values.iter().map(AxisValue::to_query).collect())
                .unwrap_or_default(),
        };
        if variants.is_empty() {
            variants = values;
        } else {
            variants = variants
                .iter()
                .flat_map(|v| values.iter().map(move |o| format!("{v},{o}")))
                .collect();
            variants.sort();
        }
    }

    Some(FamilyQuery {
        family: format!("{}:{}@{}", font.family, axes.join(","), variants.join(";")),
        text,
    })
}
