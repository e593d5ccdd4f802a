//! Font resolution options and their defaults.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::FontFormat;

/// Subsets requested when the caller does not choose any.
pub const DEFAULT_SUBSETS: [&str; 7] = [
    "cyrillic-ext",
    "cyrillic",
    "greek-ext",
    "greek",
    "vietnamese",
    "latin-ext",
    "latin",
];

/// A requestable `font-style`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        }
    }

    /// Whether this style is slanted (italic or oblique).
    pub fn is_slanted(self) -> bool {
        !matches!(self, FontStyle::Normal)
    }

    /// Parse a CSS `font-style` keyword. Multi-token values such as
    /// `oblique 0deg 15deg` parse by their first keyword.
    pub fn from_css(value: &str) -> Option<Self> {
        match value.split_whitespace().next()?.to_ascii_lowercase().as_str() {
            "normal" => Some(FontStyle::Normal),
            "italic" => Some(FontStyle::Italic),
            "oblique" => Some(FontStyle::Oblique),
            _ => None,
        }
    }
}

impl std::fmt::Display for FontStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully defaulted options handed to every provider.
///
/// A weight token containing a space (`"100 900"`) requests a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveOptions {
    pub weights: Vec<String>,
    pub styles: Vec<FontStyle>,
    /// Empty means no subset filtering.
    pub subsets: Vec<String>,
    pub formats: Vec<FontFormat>,
    /// Provider-specific family options, keyed by provider name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            weights: vec!["400".to_string()],
            styles: vec![FontStyle::Normal, FontStyle::Italic],
            subsets: DEFAULT_SUBSETS.iter().map(|s| s.to_string()).collect(),
            formats: vec![FontFormat::Woff2],
            options: BTreeMap::new(),
        }
    }
}

impl ResolveOptions {
    /// Decode the family options addressed to `provider`, if any.
    pub fn provider_options<T: DeserializeOwned>(&self, provider: &str) -> anyhow::Result<Option<T>> {
        match self.options.get(provider) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Whether `style` was requested.
    pub fn wants_style(&self, style: FontStyle) -> bool {
        self.styles.contains(&style)
    }

    /// Whether `subset` passes the subset filter.
    pub fn wants_subset(&self, subset: &str) -> bool {
        self.subsets.is_empty() || self.subsets.iter().any(|s| s == subset)
    }
}

/// Caller-facing options; unset fields fall back to [`ResolveOptions::default`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialResolveOptions {
    pub weights: Option<Vec<String>>,
    pub styles: Option<Vec<FontStyle>>,
    pub subsets: Option<Vec<String>>,
    pub formats: Option<Vec<FontFormat>>,
    pub options: Option<BTreeMap<String, Value>>,
}

impl PartialResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weights<I, S>(mut self, weights: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.weights = Some(weights.into_iter().map(Into::into).collect());
        self
    }

    pub fn styles(mut self, styles: impl IntoIterator<Item = FontStyle>) -> Self {
        self.styles = Some(styles.into_iter().collect());
        self
    }

    pub fn subsets<I, S>(mut self, subsets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subsets = Some(subsets.into_iter().map(Into::into).collect());
        self
    }

    pub fn formats(mut self, formats: impl IntoIterator<Item = FontFormat>) -> Self {
        self.formats = Some(formats.into_iter().collect());
        self
    }

    /// Attach family options for one provider.
    pub fn provider_options(mut self, provider: impl Into<String>, value: Value) -> Self {
        self.options
            .get_or_insert_with(BTreeMap::new)
            .insert(provider.into(), value);
        self
    }

    /// Merge over the documented defaults.
    pub fn resolve(self) -> ResolveOptions {
        let defaults = ResolveOptions::default();
        ResolveOptions {
            weights: self.weights.unwrap_or(defaults.weights),
            styles: self.styles.unwrap_or(defaults.styles),
            subsets: self.subsets.unwrap_or(defaults.subsets),
            formats: self.formats.unwrap_or(defaults.formats),
            options: self.options.unwrap_or(defaults.options),
        }
    }
}

impl From<ResolveOptions> for PartialResolveOptions {
    fn from(options: ResolveOptions) -> Self {
        Self {
            weights: Some(options.weights),
            styles: Some(options.styles),
            subsets: Some(options.subsets),
            formats: Some(options.formats),
            options: Some(options.options),
        }
    }
}
