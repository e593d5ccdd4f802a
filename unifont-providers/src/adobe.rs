//! Adobe Fonts (Typekit) web project kits.
//!
//! Kit metadata is cached like any other provider data. A family missing
//! from every kit triggers one forced refresh of the kits (at most once per
//! [`KIT_REFRESH_TIMEOUT`]); if it is still missing afterwards it is
//! remembered as not found until the next refresh.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unifont_cache::{CacheKeyFactory, CachedStorage};
use unifont_core::{
    FaceDescriptor, FontStyle, InitializedProvider, ListFonts, Provider, ProviderContext,
    ResolveFont, ResolveFontResult, ResolveOptions, prepare_weights,
};
use unifont_css::extract_faces;

use crate::common::data_key;
use crate::fetch::Fetcher;

pub const PROVIDER_NAME: &str = "adobe";

const API_BASE_URL: &str = "https://typekit.com/api/v1/json";
const CSS_BASE_URL: &str = "https://use.typekit.net";

/// Minimum time between two forced kit refreshes.
pub const KIT_REFRESH_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// One kit id or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KitIds {
    One(String),
    Many(Vec<String>),
}

impl Default for KitIds {
    fn default() -> Self {
        KitIds::Many(Vec::new())
    }
}

impl KitIds {
    /// Non-empty ids, in declaration order.
    pub fn to_vec(&self) -> Vec<String> {
        let ids = match self {
            KitIds::One(id) => std::slice::from_ref(id),
            KitIds::Many(ids) => ids.as_slice(),
        };
        ids.iter().filter(|id| !id.is_empty()).cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdobeOptions {
    pub id: KitIds,
}

#[derive(Debug, Deserialize)]
struct KitResponse {
    kit: Option<AdobeFontKit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AdobeFontKit {
    id: String,
    #[serde(default)]
    families: Vec<AdobeFontFamily>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AdobeFontFamily {
    id: String,
    name: String,
    #[serde(default)]
    css_names: Vec<String>,
    /// Font variation descriptions (`n4`, `i7`, ...).
    #[serde(default)]
    variations: Vec<String>,
}

impl AdobeFontFamily {
    /// Family name used inside the kit stylesheet.
    fn css_name(&self) -> String {
        self.css_names
            .first()
            .cloned()
            .unwrap_or_else(|| self.name.to_lowercase().split(' ').collect::<Vec<_>>().join("-"))
    }
}

/// CSS weight of a variation (`n4` -> `400`).
fn variation_weight(variation: &str) -> String {
    let digit = variation.chars().last().map(String::from).unwrap_or_default();
    format!("{digit}00")
}

/// The Adobe Fonts provider.
#[derive(Debug, Clone)]
pub struct AdobeProvider {
    options: AdobeOptions,
    api_base_url: String,
    css_base_url: String,
}

impl AdobeProvider {
    pub fn new(options: AdobeOptions) -> Self {
        Self {
            options,
            api_base_url: API_BASE_URL.to_string(),
            css_base_url: CSS_BASE_URL.to_string(),
        }
    }

    /// Override the kit metadata API root.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Override the origin serving kit stylesheets.
    pub fn with_css_base_url(mut self, url: impl Into<String>) -> Self {
        self.css_base_url = url.into();
        self
    }
}

#[async_trait]
impl Provider for AdobeProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn options(&self) -> Value {
        serde_json::to_value(&self.options).unwrap_or(Value::Null)
    }

    async fn init(&self, ctx: ProviderContext) -> anyhow::Result<Option<InitializedProvider>> {
        let kit_ids = self.options.id.to_vec();
        if kit_ids.is_empty() {
            log::debug!("adobe: no kit id configured");
            return Ok(None);
        }

        let adobe = Adobe {
            kit_ids,
            api: Fetcher::with_base_url(self.api_base_url.clone()),
            css: Fetcher::with_base_url(self.css_base_url.clone()),
            storage: ctx.storage,
            keys: ctx.cache_key,
            state: Mutex::new(KitState::default()),
        };
        adobe.fetch_kits(false).await?;
        Ok(Some(InitializedProvider::with_list_fonts(adobe)))
    }
}

#[derive(Debug, Default)]
struct KitState {
    kits: Vec<AdobeFontKit>,
    /// Family names across every kit, first occurrence wins.
    families: Vec<String>,
    not_found: HashSet<String>,
    last_refresh: Option<Instant>,
}

struct Adobe {
    kit_ids: Vec<String>,
    api: Fetcher,
    css: Fetcher,
    storage: CachedStorage,
    keys: CacheKeyFactory,
    state: Mutex<KitState>,
}

impl Adobe {
    async fn kit_meta(&self, id: &str) -> anyhow::Result<AdobeFontKit> {
        let response: KitResponse = self.api.get(&format!("/kits/{id}/published")).json().await?;
        response
            .kit
            .ok_or_else(|| anyhow!("No font metadata found in adobe response."))
    }

    async fn fetch_kit(&self, id: &str, bypass_cache: bool) -> anyhow::Result<AdobeFontKit> {
        let key = self
            .keys
            .key_with("meta.json", |parts| parts.join(&[&"kit", &id]));
        if bypass_cache {
            let kit = self.kit_meta(id).await?;
            self.storage.set_item(&key, &kit).await?;
            return Ok(kit);
        }
        self.storage
            .get_or_init(&key, move || self.kit_meta(id))
            .await
    }

    async fn fetch_kits(&self, bypass_cache: bool) -> anyhow::Result<()> {
        let kits = futures::future::try_join_all(
            self.kit_ids
                .iter()
                .map(|id| self.fetch_kit(id, bypass_cache)),
        )
        .await?;

        let mut families: Vec<String> = Vec::new();
        for family in kits.iter().flat_map(|kit| &kit.families) {
            if !families.contains(&family.name) {
                families.push(family.name.clone());
            }
        }
        log::debug!("adobe: {} families across {} kits", families.len(), kits.len());

        let mut state = self.state.lock();
        state.kits = kits;
        state.families = families;
        state.not_found.clear();
        Ok(())
    }

    fn knows(&self, family: &str) -> bool {
        self.state.lock().families.iter().any(|f| f == family)
    }

    fn is_not_found(&self, family: &str) -> bool {
        self.state.lock().not_found.contains(family)
    }

    fn mark_not_found(&self, family: &str) {
        self.state.lock().not_found.insert(family.to_string());
    }

    /// Claim the refresh slot if the last refresh is old enough.
    fn claim_refresh(&self) -> bool {
        let mut state = self.state.lock();
        let due = state
            .last_refresh
            .is_none_or(|at| at.elapsed() > KIT_REFRESH_TIMEOUT);
        if due {
            state.last_refresh = Some(Instant::now());
        }
        due
    }

    /// Every kit declaring `family`, with its entry.
    fn kits_for(&self, family: &str) -> Vec<(String, AdobeFontFamily)> {
        self.state
            .lock()
            .kits
            .iter()
            .filter_map(|kit| {
                kit.families
                    .iter()
                    .find(|f| f.name == family)
                    .map(|f| (kit.id.clone(), f.clone()))
            })
            .collect()
    }

    async fn font_details(
        &self,
        family: &str,
        options: &ResolveOptions,
    ) -> anyhow::Result<Vec<FaceDescriptor>> {
        for (kit_id, font) in self.kits_for(family) {
            let Some(weights) = matching_weights(&font, options) else {
                continue;
            };
            let css = self.css.get(&format!("/{kit_id}.css")).text().await?;
            return Ok(extract_faces(&css, Some(&font.css_name()))
                .into_iter()
                .filter(|face| face_matches(face, options, &weights))
                .collect());
        }
        Ok(Vec::new())
    }
}

/// Weights the family serves for this request, or `None` when none of its
/// variations match.
pub(crate) fn matching_weights(font: &AdobeFontFamily, options: &ResolveOptions) -> Option<Vec<String>> {
    let available: Vec<String> = font.variations.iter().map(|v| variation_weight(v)).collect();
    let weights: Vec<String> = prepare_weights(&options.weights, &available, false)
        .into_iter()
        .map(|w| w.weight)
        .collect();

    let any_variation = font.variations.iter().any(|variation| {
        let style = if variation.contains('i') { FontStyle::Italic } else { FontStyle::Normal };
        (style == FontStyle::Normal || options.wants_style(style))
            && weights.contains(&variation_weight(variation))
    });
    any_variation.then_some(weights)
}

/// Whether an extracted face matches the requested styles and weights.
fn face_matches(face: &FaceDescriptor, options: &ResolveOptions, weights: &[String]) -> bool {
    let style_ok = face
        .style
        .as_deref()
        .is_none_or(|style| FontStyle::from_css(style).is_some_and(|s| options.wants_style(s)));
    let weight_ok = face.weight.as_ref().and_then(|w| w.bounds()).is_none_or(|(min, max)| {
        weights
            .iter()
            .any(|w| w.parse::<f64>().is_ok_and(|w| w >= min && w <= max))
    });
    style_ok && weight_ok
}

#[async_trait]
impl ResolveFont for Adobe {
    async fn resolve_font(
        &self,
        family: &str,
        options: &ResolveOptions,
    ) -> anyhow::Result<Option<ResolveFontResult>> {
        if self.is_not_found(family) {
            return Ok(None);
        }
        if !self.knows(family) && self.claim_refresh() {
            log::debug!("adobe: `{family}` not in any kit, refreshing kits");
            self.fetch_kits(true).await?;
        }
        if !self.knows(family) {
            self.mark_not_found(family);
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

#[async_trait]
impl ListFonts for Adobe {
    async fn list_fonts(&self) -> anyhow::Result<Option<Vec<String>>> {
        Ok(Some(self.state.lock().families.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unifont_core::{FontSource, FontWeight, PartialResolveOptions};

    fn family(variations: &[&str]) -> AdobeFontFamily {
        AdobeFontFamily {
            id: "abcd".into(),
            name: "Aleo Sans".into(),
            css_names: Vec::new(),
            variations: variations.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_kit_ids() {
        assert_eq!(KitIds::One("abc".into()).to_vec(), vec!["abc".to_string()]);
        assert!(KitIds::One(String::new()).to_vec().is_empty());
        let ids: KitIds = serde_json::from_value(serde_json::json!(["a", "b"])).unwrap();
        assert_eq!(ids.to_vec(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_css_name_falls_back_to_slug() {
        assert_eq!(family(&[]).css_name(), "aleo-sans");
        let mut named = family(&[]);
        named.css_names = vec!["aleo-sans-web".into()];
        assert_eq!(named.css_name(), "aleo-sans-web");
    }

    #[test]
    fn test_matching_weights() {
        let font = family(&["n4", "i4", "n7"]);
        assert_eq!(
            matching_weights(&font, &ResolveOptions::default()),
            Some(vec!["400".to_string()])
        );
        let options = PartialResolveOptions::new().weights(["300"]).resolve();
        assert_eq!(matching_weights(&font, &options), None);

        let italic_only = family(&["i7"]);
        let options = PartialResolveOptions::new()
            .weights(["700"])
            .styles([FontStyle::Normal])
            .resolve();
        assert_eq!(matching_weights(&italic_only, &options), None);
    }

    #[test]
    fn test_face_filter() {
        let options = PartialResolveOptions::new()
            .weights(["400"])
            .styles([FontStyle::Normal])
            .resolve();
        let weights = vec!["400".to_string()];
        let mut face = FaceDescriptor::new(vec![FontSource::remote("/a.woff2")]);
        assert!(face_matches(&face, &options, &weights));

        face.style = Some("italic".into());
        assert!(!face_matches(&face, &options, &weights));

        face.style = Some("normal".into());
        face.weight = Some(FontWeight::Number(700.0));
        assert!(!face_matches(&face, &options, &weights));

        face.weight = Some(FontWeight::Range(300.0, 500.0));
        assert!(face_matches(&face, &options, &weights));
    }
}
