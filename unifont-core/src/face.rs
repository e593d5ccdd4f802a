//! `@font-face` descriptor types.
//!
//! Field names serialize in camelCase (`unicodeRange`, `originalURL`, ...) so
//! cached descriptors stay readable next to the CSS they came from.

use std::collections::BTreeMap;

use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};

/// A `local(...)` source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSource {
    /// Locally installed font name.
    pub name: String,
}

/// A `url(...)` source with its optional `format()` and `tech()` hints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteSource {
    /// Location of the font binary.
    pub url: String,
    /// URL before a provider rewrote it (e.g. relative path made absolute).
    #[serde(rename = "originalURL", default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    /// Declared format (`woff2`, `truetype`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Declared font technology (`variations`, `color-COLRv1`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech: Option<String>,
}

/// One entry of a face's `src` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontSource {
    Local(LocalSource),
    Remote(RemoteSource),
}

/// Identity used to dedup sources: two sources are the same if they share a
/// local name, or a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId<'a> {
    Name(&'a str),
    Url(&'a str),
}

impl FontSource {
    /// `local(<name>)`.
    pub fn local(name: impl Into<String>) -> Self {
        FontSource::Local(LocalSource { name: name.into() })
    }

    /// `url(<url>)` with no format hint.
    pub fn remote(url: impl Into<String>) -> Self {
        FontSource::Remote(RemoteSource {
            url: url.into(),
            ..RemoteSource::default()
        })
    }

    /// `url(<url>) format(<format>)`.
    pub fn remote_with_format(url: impl Into<String>, format: impl Into<String>) -> Self {
        FontSource::Remote(RemoteSource {
            url: url.into(),
            format: Some(format.into()),
            ..RemoteSource::default()
        })
    }

    /// Declared format, if this is a remote source that has one.
    pub fn format(&self) -> Option<&str> {
        match self {
            FontSource::Remote(remote) => remote.format.as_deref(),
            FontSource::Local(_) => None,
        }
    }

    pub fn identity(&self) -> SourceId<'_> {
        match self {
            FontSource::Local(local) => SourceId::Name(&local.name),
            FontSource::Remote(remote) => SourceId::Url(&remote.url),
        }
    }
}

/// A `font-weight` value: a number, a keyword/numeric string, or a
/// `[min, max]` variable-axis range.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    Number(f64),
    Range(f64, f64),
    Text(String),
}

impl FontWeight {
    /// Inclusive numeric bounds, when the weight is numeric.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            FontWeight::Number(n) => Some((*n, *n)),
            FontWeight::Range(min, max) => Some((*min, *max)),
            FontWeight::Text(text) => text.trim().parse().ok().map(|n| (n, n)),
        }
    }
}

/// Whole weights serialize as integers (`400`, not `400.0`).
impl Serialize for FontWeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FontWeight::Number(n) => WeightNumber(*n).serialize(serializer),
            FontWeight::Range(min, max) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(&WeightNumber(*min))?;
                tuple.serialize_element(&WeightNumber(*max))?;
                tuple.end()
            }
            FontWeight::Text(text) => serializer.serialize_str(text),
        }
    }
}

struct WeightNumber(f64);

impl Serialize for WeightNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Integers are exact in f64 up to 2^53.
        if self.0.fract() == 0.0 && self.0.abs() < 9_007_199_254_740_992.0 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl std::fmt::Display for FontWeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontWeight::Number(n) => write!(f, "{n}"),
            FontWeight::Range(min, max) => write!(f, "{min} {max}"),
            FontWeight::Text(text) => f.write_str(text),
        }
    }
}

/// Request metadata a consumer should use when downloading a face.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FetchInit {
    /// Extra HTTP headers (authorization, referer, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// Bookkeeping attached by providers. Never part of a face's identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaceMeta {
    /// Fallback priority; smaller is preferred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    /// Subset this face covers (`latin`, `cyrillic-ext`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<FetchInit>,
    /// Package the face was read from (npm provider).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

/// One resolved `@font-face` rule.
///
/// `src` is never empty for descriptors handed out by the extractor, the
/// normalizer or a provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDescriptor {
    pub src: Vec<FontSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stretch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unicode_range: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_settings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_settings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<FaceMeta>,
}

/// Every descriptor field except `src` and `meta`.
#[derive(Serialize)]
struct FaceKey<'a> {
    display: &'a Option<String>,
    weight: &'a Option<FontWeight>,
    stretch: &'a Option<String>,
    style: &'a Option<String>,
    unicode_range: &'a Option<Vec<String>>,
    feature_settings: &'a Option<String>,
    variation_settings: &'a Option<String>,
}

impl FaceDescriptor {
    /// Descriptor with the given sources and no other fields.
    pub fn new(src: Vec<FontSource>) -> Self {
        Self {
            src,
            ..Self::default()
        }
    }

    /// String key of every field except `src` and `meta`. Two descriptors
    /// with equal keys describe the same face.
    pub fn merge_key(&self) -> String {
        let key = FaceKey {
            display: &self.display,
            weight: &self.weight,
            stretch: &self.stretch,
            style: &self.style,
            unicode_range: &self.unicode_range,
            feature_settings: &self.feature_settings,
            variation_settings: &self.variation_settings,
        };
        // Serializing plain strings and numbers cannot fail.
        serde_json::to_string(&key).unwrap_or_default()
    }

    /// Append sources whose identity is not already present.
    pub fn extend_sources<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = FontSource>,
    {
        for source in sources {
            if !self.src.iter().any(|s| s.identity() == source.identity()) {
                self.src.push(source);
            }
        }
    }

    /// Mutable access to the meta block, creating it if absent.
    pub fn meta_mut(&mut self) -> &mut FaceMeta {
        self.meta.get_or_insert_with(FaceMeta::default)
    }
}
