//! TTL and schema-version aware storage wrapper.
//!
//! Values are written inside a [`CacheEntry`] envelope carrying an expiry
//! timestamp and the schema version of the writer. An entry is served only
//! while it is unexpired and its version equals the running version, so an
//! upgrade forces a full recompute.
//!
//! There is no locking: two concurrent [`CachedStorage::get_or_init`] calls
//! for the same missing key both run `init` and both write, last write wins.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::Storage;

/// One week, the default time-to-live of a cache entry.
pub const ONE_WEEK_SECS: u64 = 60 * 60 * 24 * 7;

/// Cache behaviour shared by every provider of an orchestrator.
///
/// There is no `Default`: the schema version belongs to the embedding crate
/// and must be passed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds an entry stays valid after it is written.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Version stamped into every entry; entries written under another
    /// version are treated as missing.
    pub schema_version: String,
}

fn default_ttl_secs() -> u64 {
    ONE_WEEK_SECS
}

impl CacheConfig {
    /// Default TTL with an explicit schema version.
    pub fn for_version(schema_version: impl Into<String>) -> Self {
        Self {
            ttl_secs: ONE_WEEK_SECS,
            schema_version: schema_version.into(),
        }
    }
}

/// Envelope persisted in the raw backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Expiry as milliseconds since the Unix epoch.
    pub expires_at: i64,
    /// Schema version of the writer.
    pub schema_version: String,
    /// Cached payload.
    pub data: Value,
}

impl CacheEntry {
    fn is_fresh(&self, now: i64, schema_version: &str) -> bool {
        now <= self.expires_at && self.schema_version == schema_version
    }
}

/// Cached, optionally namespaced view over a raw [`Storage`].
#[derive(Clone)]
pub struct CachedStorage {
    backend: Arc<dyn Storage>,
    namespace: Option<String>,
    config: CacheConfig,
}

impl std::fmt::Debug for CachedStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedStorage")
            .field("namespace", &self.namespace)
            .field("config", &self.config)
            .finish()
    }
}

impl CachedStorage {
    /// Wrap `backend` without a namespace.
    pub fn new(backend: Arc<dyn Storage>, config: CacheConfig) -> Self {
        Self {
            backend,
            namespace: None,
            config,
        }
    }

    /// Prefix every key with `<namespace>:`. An empty namespace is ignored.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Key actually used in the backend for `key`.
    pub fn resolve_key(&self, key: &str) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}:{key}"),
            None => key.to_string(),
        }
    }

    /// Read a fresh entry, or `None` when absent, expired, written by
    /// another schema version or not decodable as `T`.
    pub async fn get_item<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let resolved = self.resolve_key(key);
        self.read_fresh(&resolved, now_millis()).await
    }

    /// Read a fresh entry, computing and storing it with `init` on a miss.
    pub async fn get_or_init<T, F, Fut>(&self, key: &str, init: F) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let resolved = self.resolve_key(key);
        let now = now_millis();
        if let Some(data) = self.read_fresh(&resolved, now).await? {
            log::debug!("cache hit: {resolved}");
            return Ok(data);
        }

        log::debug!("cache miss: {resolved}");
        let data = init().await?;
        self.write(&resolved, &data, now).await?;
        Ok(data)
    }

    /// Unconditionally write a fresh entry.
    pub async fn set_item<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> anyhow::Result<()> {
        let resolved = self.resolve_key(key);
        self.write(&resolved, data, now_millis()).await
    }

    async fn read_fresh<T: DeserializeOwned>(
        &self,
        resolved: &str,
        now: i64,
    ) -> anyhow::Result<Option<T>> {
        let Some(raw) = self.backend.get_item(resolved).await? else {
            return Ok(None);
        };
        let entry: CacheEntry = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("ignoring malformed cache entry {resolved}: {e}");
                return Ok(None);
            }
        };
        if !entry.is_fresh(now, &self.config.schema_version) {
            log::debug!(
                "cache entry {resolved} invalidated (version {}, expires {})",
                entry.schema_version,
                entry.expires_at
            );
            return Ok(None);
        }
        match serde_json::from_value(entry.data) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                log::debug!("cache entry {resolved} has an unexpected shape: {e}");
                Ok(None)
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(
        &self,
        resolved: &str,
        data: &T,
        now: i64,
    ) -> anyhow::Result<()> {
        let ttl_ms = i64::try_from(self.config.ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        let entry = CacheEntry {
            expires_at: now.saturating_add(ttl_ms),
            schema_version: self.config.schema_version.clone(),
            data: serde_json::to_value(data)?,
        };
        self.backend
            .set_item(resolved, serde_json::to_value(entry)?)
            .await
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
