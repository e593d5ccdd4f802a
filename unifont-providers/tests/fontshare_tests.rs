//! Fontshare provider against a mock API.

mod common;

use common::init;
use serde_json::json;
use unifont_core::{FontWeight, ResolveOptions};
use unifont_providers::FontshareProvider;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn style(is_italic: bool, number: u32, weight: u32) -> serde_json::Value {
    json!({
        "default": false,
        "file": "",
        "id": format!("style-{number}"),
        "is_italic": is_italic,
        "is_variable": false,
        "weight": { "label": "", "name": "", "native_name": null, "number": number, "weight": weight }
    })
}

async fn mock_catalogue(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/fonts"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fonts": [{ "slug": "satoshi", "name": "Satoshi", "styles": [style(false, 400, 400), style(true, 401, 400), style(false, 700, 700)] }],
            "has_more": true
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fonts"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fonts": [{ "slug": "general-sans", "name": "General Sans", "styles": [] }],
            "has_more": false
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_paginates_and_resolves() {
    let server = MockServer::start().await;
    mock_catalogue(&server).await;
    Mock::given(method("GET"))
        .and(path("/css"))
        .and(query_param("f[]", "satoshi@400,401"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "@font-face { font-family: 'Satoshi'; src: url('//cdn.fontshare.com/satoshi-400.woff2') format('woff2'); font-weight: 400; font-style: normal; }
             @font-face { font-family: 'Satoshi'; src: url('//cdn.fontshare.com/satoshi-400i.woff2') format('woff2'); font-weight: 400; font-style: italic; }",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let provider = FontshareProvider::new().with_base_url(server.uri());
    let (fontshare, _backend) = init(&provider).await;
    assert!(!fontshare.can_list_fonts());

    let result = fontshare
        .resolver()
        .resolve_font("Satoshi", &ResolveOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.fonts.len(), 2);
    assert_eq!(result.fonts[0].weight, Some(FontWeight::Number(400.0)));
    assert_eq!(result.fonts[1].style.as_deref(), Some("italic"));
}

#[tokio::test]
async fn test_family_without_matching_styles() {
    let server = MockServer::start().await;
    mock_catalogue(&server).await;

    let provider = FontshareProvider::new().with_base_url(server.uri());
    let (fontshare, _backend) = init(&provider).await;
    let result = fontshare
        .resolver()
        .resolve_font("General Sans", &ResolveOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert!(result.fonts.is_empty());
    assert!(
        fontshare
            .resolver()
            .resolve_font("Unknown", &ResolveOptions::default())
            .await
            .unwrap()
            .is_none()
    );
}
