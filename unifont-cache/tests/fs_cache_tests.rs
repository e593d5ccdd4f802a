//! Cached storage persisted through the filesystem backend.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use unifont_cache::{CacheConfig, CacheKeyFactory, CachedStorage, FsStorage, Storage};

fn cached(dir: &TempDir, version: &str, keys: &CacheKeyFactory) -> CachedStorage {
    let backend: Arc<dyn Storage> = Arc::new(FsStorage::new(dir.path()));
    CachedStorage::new(backend, CacheConfig::for_version(version)).with_namespace(keys.namespace())
}

#[tokio::test]
async fn test_entries_survive_a_new_storage_instance() {
    let dir = TempDir::new().unwrap();
    let keys = CacheKeyFactory::new("google", &json!({ "experimental": {} }));
    let key = keys.key("meta.json");

    let first = cached(&dir, "1.0.0", &keys);
    let computed: Vec<String> = first
        .get_or_init(&key, || async { Ok::<_, anyhow::Error>(vec!["Roboto".to_string()]) })
        .await
        .unwrap();
    assert_eq!(computed, vec!["Roboto"]);

    let second = cached(&dir, "1.0.0", &keys);
    let reread: Vec<String> = second
        .get_or_init(&key, || async {
            Err::<Vec<String>, _>(anyhow::anyhow!("should have been a cache hit"))
        })
        .await
        .unwrap();
    assert_eq!(reread, vec!["Roboto"]);

    assert!(dir.path().join("google").is_dir());
}

#[tokio::test]
async fn test_new_schema_version_ignores_old_files() {
    let dir = TempDir::new().unwrap();
    let keys = CacheKeyFactory::new("bunny", &());
    let key = keys.key("meta.json");

    cached(&dir, "1.0.0", &keys).set_item(&key, &1u32).await.unwrap();

    let upgraded = cached(&dir, "2.0.0", &keys);
    assert_eq!(upgraded.get_item::<u32>(&key).await.unwrap(), None);

    let recomputed: u32 = upgraded
        .get_or_init(&key, || async { Ok::<_, anyhow::Error>(2u32) })
        .await
        .unwrap();
    assert_eq!(recomputed, 2);
    assert_eq!(
        cached(&dir, "2.0.0", &keys).get_item::<u32>(&key).await.unwrap(),
        Some(2)
    );
}
