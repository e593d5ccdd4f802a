//! Adobe Fonts provider against a mock API.

mod common;

use std::sync::Arc;

use common::{context, init};
use serde_json::json;
use unifont_cache::MemoryStorage;
use unifont_core::{FontWeight, Provider, ResolveOptions};
use unifont_providers::{AdobeOptions, AdobeProvider, KitIds};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KIT_CSS: &str = "
@font-face { font-family: 'aleo'; src: url(https://use.typekit.test/n4.woff2) format('woff2'); font-style: normal; font-weight: 400; }
@font-face { font-family: 'aleo'; src: url(https://use.typekit.test/i4.woff2) format('woff2'); font-style: italic; font-weight: 400; }
@font-face { font-family: 'aleo'; src: url(https://use.typekit.test/n7.woff2) format('woff2'); font-style: normal; font-weight: 700; }
@font-face { font-family: 'other'; src: url(https://use.typekit.test/other.woff2) format('woff2'); }
";

fn kit() -> serde_json::Value {
    json!({
        "kit": {
            "id": "abc123",
            "families": [{
                "id": "fam1",
                "name": "Aleo",
                "slug": "aleo",
                "css_names": ["aleo"],
                "css_stack": "\"aleo\",serif",
                "variations": ["n4", "i4", "n7"]
            }]
        }
    })
}

fn provider(server: &MockServer, id: KitIds) -> AdobeProvider {
    AdobeProvider::new(AdobeOptions { id })
        .with_api_base_url(server.uri())
        .with_css_base_url(server.uri())
}

#[tokio::test]
async fn test_resolves_kit_family() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/kits/abc123/published"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kit()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/abc123.css"))
        .respond_with(ResponseTemplate::new(200).set_body_string(KIT_CSS))
        .expect(1)
        .mount(&server)
        .await;

    let (adobe, _backend) = init(&provider(&server, KitIds::One("abc123".into()))).await;
    assert_eq!(
        adobe.lister().unwrap().list_fonts().await.unwrap(),
        Some(vec!["Aleo".to_string()])
    );

    let result = adobe
        .resolver()
        .resolve_font("Aleo", &ResolveOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.fonts.len(), 2);
    assert!(result.fonts.iter().all(|f| f.weight == Some(FontWeight::Number(400.0))));
    assert_eq!(result.fonts[1].style.as_deref(), Some("italic"));
}

#[tokio::test]
async fn test_unknown_family_refreshes_once_then_is_negatively_cached() {
    let server = MockServer::start().await;
    // Init plus one forced refresh.
    Mock::given(method("GET"))
        .and(path("/kits/abc123/published"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kit()))
        .expect(2)
        .mount(&server)
        .await;

    let (adobe, _backend) = init(&provider(&server, KitIds::Many(vec!["abc123".into()]))).await;
    let options = ResolveOptions::default();
    for family in ["Missing", "Missing", "Also Missing"] {
        assert!(adobe.resolver().resolve_font(family, &options).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_opts_out_without_kit_ids() {
    let provider = AdobeProvider::new(AdobeOptions::default());
    let backend = Arc::new(MemoryStorage::new());
    let initialized = provider.init(context(&provider, backend)).await.unwrap();
    assert!(initialized.is_none());
}

#[tokio::test]
async fn test_missing_kit_metadata_fails_init() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/kits/gone/published"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kit": null })))
        .mount(&server)
        .await;

    let provider = provider(&server, KitIds::One("gone".into()));
    let backend = Arc::new(MemoryStorage::new());
    let err = provider.init(context(&provider, backend)).await.unwrap_err();
    assert_eq!(err.to_string(), "No font metadata found in adobe response.");
}
