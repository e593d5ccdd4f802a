//! Physical font formats and their CSS `format()` names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A font file format a caller can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFormat {
    Woff2,
    Woff,
    Otf,
    Ttf,
    Eot,
}

impl FontFormat {
    /// Every format, in source priority order.
    pub const ALL: [FontFormat; 5] = [
        FontFormat::Woff2,
        FontFormat::Woff,
        FontFormat::Otf,
        FontFormat::Ttf,
        FontFormat::Eot,
    ];

    /// Short name as requested by callers (`otf`, `ttf`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            FontFormat::Woff2 => "woff2",
            FontFormat::Woff => "woff",
            FontFormat::Otf => "otf",
            FontFormat::Ttf => "ttf",
            FontFormat::Eot => "eot",
        }
    }

    /// Canonical name used in CSS `format()` hints.
    pub fn css_name(self) -> &'static str {
        match self {
            FontFormat::Woff2 => "woff2",
            FontFormat::Woff => "woff",
            FontFormat::Otf => "opentype",
            FontFormat::Ttf => "truetype",
            FontFormat::Eot => "embedded-opentype",
        }
    }

    /// Parse either the short or the canonical CSS name.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        FontFormat::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(token) || f.css_name().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FontFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FontFormat::from_token(s).ok_or_else(|| format!("unknown font format '{s}'"))
    }
}

/// Rewrite a raw `format()` token to its canonical CSS name, leaving
/// unknown tokens untouched.
pub fn canonical_format(raw: &str) -> String {
    match FontFormat::from_token(raw) {
        Some(format) => format.css_name().to_string(),
        None => raw.to_string(),
    }
}

/// Sort rank of a source's declared format: no format first, then
/// `woff2, woff, opentype, truetype, embedded-opentype, svg`, anything else last.
/// An empty `format("")` ranks as `woff2`.
pub fn format_priority(format: Option<&str>) -> usize {
    let Some(format) = format else {
        return 0;
    };
    if format.trim().is_empty() {
        return 1;
    }
    if let Some(known) = FontFormat::from_token(format) {
        return 1 + FontFormat::ALL.iter().position(|f| *f == known).unwrap_or(0);
    }
    if format.eq_ignore_ascii_case("svg") {
        return FontFormat::ALL.len() + 1;
    }
    FontFormat::ALL.len() + 2
}
