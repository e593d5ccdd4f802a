//! Raw key/value storage backends.
//!
//! A [`Storage`] only moves JSON values in and out; expiry, versioning and
//! namespacing are layered on top by [`CachedStorage`](crate::CachedStorage).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::cache_key::sanitize;
use crate::error::CacheError;

/// Caller-supplied key/value backend.
///
/// Implementations must be `Send + Sync`: one backend is shared by every
/// provider of an orchestrator.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, or `None` when absent.
    async fn get_item(&self, key: &str) -> anyhow::Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: Value) -> anyhow::Result<()>;
}

/// Process-local storage backed by a map. The default backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Snapshot of every stored key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_item(&self, key: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: Value) -> anyhow::Result<()> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// Filesystem storage: one JSON file per key below a base directory.
///
/// `:` separators in keys become directory levels, so
/// `google:1a2b-meta.json` is stored at `<base>/google/1a2b-meta.json`.
#[derive(Debug, Clone)]
pub struct FsStorage {
    base: PathBuf,
}

impl FsStorage {
    /// Store cache files below `base`. The directory is created lazily.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Store cache files in the platform cache directory
    /// (`~/.cache/unifont` on Linux), falling back to the system temp dir.
    pub fn default_location() -> Self {
        let base = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("unifont");
        Self::new(base)
    }

    /// Base directory of this store.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.base.clone();
        for segment in key.split(':') {
            // Keep every segment inside the base directory.
            let segment = match sanitize(segment).as_str() {
                "" | "." | ".." => "_".to_string(),
                other => other.to_string(),
            };
            path.push(segment);
        }
        path
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn get_item(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let path = self.path_for(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }.into()),
        };
        let value = serde_json::from_str(&content).map_err(CacheError::from)?;
        Ok(Some(value))
    }

    async fn set_item(&self, key: &str, value: Value) -> anyhow::Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CacheError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let content = serde_json::to_string(&value).map_err(CacheError::from)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| CacheError::Io { path, source })?;
        Ok(())
    }
}
