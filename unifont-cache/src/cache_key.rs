//! Cache key construction bound to a provider identity.
//!
//! Keys have the shape `<provider>:<hash(options)>-<body>-<label>`, with the
//! body segment omitted when empty. Every component is sanitized to
//! `[A-Za-z0-9_.-]`, so keys are safe to use as file names once the `:`
//! separator is mapped to a path component.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Display;

/// Number of digest bytes kept in a stable hash (rendered as hex).
const HASH_BYTES: usize = 8;

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Hash any serializable value into a short, deterministic hex string.
///
/// Object keys are sorted before hashing, so two values that serialize to
/// the same JSON modulo key order hash identically. Values that cannot be
/// represented as JSON are logged and hash as `null`, so they share a key.
pub fn stable_hash<T: Serialize + ?Sized>(value: &T) -> String {
    let value = serde_json::to_value(value).unwrap_or_else(|e| {
        log::warn!("cache key options are not representable as JSON, hashing as null: {e}");
        Value::Null
    });
    let mut canonical = String::new();
    write_canonical(&value, &mut canonical);

    let digest = Sha256::digest(canonical.as_bytes());
    digest
        .iter()
        .take(HASH_BYTES)
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Helpers handed to a key body builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyParts;

impl KeyParts {
    /// Stable hash of a serializable value (see [`stable_hash`]).
    pub fn hash<T: Serialize + ?Sized>(&self, value: &T) -> String {
        stable_hash(value)
    }

    /// Sanitize each part and hyphen-join the non-empty results.
    pub fn join(&self, parts: &[&dyn Display]) -> String {
        parts
            .iter()
            .map(|part| sanitize(&part.to_string()))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Cache key factory bound to one provider and its options.
///
/// # Example
///
/// ```rust
/// use unifont_cache::CacheKeyFactory;
///
/// let keys = CacheKeyFactory::new("google", &serde_json::json!({ "experimental": {} }));
/// let meta = keys.key("meta.json");
/// let data = keys.key_with("data.json", |p| p.join(&[&"Roboto", &p.hash(&["400"])]));
/// assert!(meta.starts_with("google:"));
/// assert!(data.ends_with("-data.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeyFactory {
    provider: String,
    provider_hash: String,
}

impl CacheKeyFactory {
    /// Bind a factory to a provider name and its options fingerprint.
    pub fn new<T: Serialize + ?Sized>(provider_name: &str, provider_options: &T) -> Self {
        Self {
            provider: sanitize(provider_name),
            provider_hash: stable_hash(provider_options),
        }
    }

    /// `<provider>:<hash(options)>`, used to namespace a provider's storage.
    pub fn namespace(&self) -> String {
        format!("{}:{}", self.provider, self.provider_hash)
    }

    /// Key with no body segment: `<provider>:<hash>-<label>`.
    pub fn key(&self, label: &str) -> String {
        self.compose(label, "")
    }

    /// Key whose body segment is produced by `build`.
    pub fn key_with<F>(&self, label: &str, build: F) -> String
    where
        F: FnOnce(&KeyParts) -> String,
    {
        let body = build(&KeyParts);
        self.compose(label, &body)
    }

    fn compose(&self, label: &str, body: &str) -> String {
        let label = sanitize(label);
        let body = sanitize(body);
        if body.is_empty() {
            format!("{}:{}-{}", self.provider, self.provider_hash, label)
        } else {
            format!("{}:{}-{}-{}", self.provider, self.provider_hash, body, label)
        }
    }
}
