//! Fontsource provider against a mock API.

mod common;

use common::init;
use serde_json::json;
use unifont_core::{FontFormat, FontSource, FontStyle, FontWeight, PartialResolveOptions};
use unifont_providers::FontsourceProvider;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_catalogue(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/fonts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "inter",
            "family": "Inter",
            "subsets": ["cyrillic", "latin"],
            "weights": [400, 700],
            "styles": ["normal", "italic"],
            "defSubset": "latin",
            "variable": true,
            "category": "sans-serif",
            "type": "google"
        }])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fonts/inter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "inter",
            "family": "Inter",
            "unicodeRange": { "latin": "U+0000-00FF,U+0131", "cyrillic": "U+0400-045F" },
            "variants": {
                "400": {
                    "normal": {
                        "latin": { "url": { "woff2": "https://cdn.test/inter-latin-400.woff2", "woff": "https://cdn.test/inter-latin-400.woff", "ttf": "https://cdn.test/inter-latin-400.ttf" } },
                        "cyrillic": { "url": { "woff2": "https://cdn.test/inter-cyrillic-400.woff2" } }
                    }
                }
            }
        })))
        .mount(server)
        .await;
}

fn provider(server: &MockServer) -> FontsourceProvider {
    FontsourceProvider::new()
        .with_base_url(server.uri())
        .with_cdn_base_url("https://cdn.test/fontsource/fonts")
}

#[tokio::test]
async fn test_static_and_variable_faces() {
    let server = MockServer::start().await;
    mock_catalogue(&server).await;
    Mock::given(method("GET"))
        .and(path("/variable/inter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "family": "Inter",
            "axes": { "wght": { "default": "400", "min": "100", "max": "900", "step": "1" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (fontsource, _backend) = init(&provider(&server)).await;
    let options = PartialResolveOptions::new()
        .weights(["400", "100 900"])
        .styles([FontStyle::Normal])
        .subsets(["latin"])
        .formats([FontFormat::Ttf, FontFormat::Woff2])
        .resolve();
    let result = fontsource
        .resolver()
        .resolve_font("Inter", &options)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.fonts.len(), 2);
    let static_face = &result.fonts[0];
    assert_eq!(static_face.weight, Some(FontWeight::Number(400.0)));
    assert_eq!(
        static_face.src,
        vec![
            FontSource::remote_with_format("https://cdn.test/inter-latin-400.ttf", "truetype"),
            FontSource::remote_with_format("https://cdn.test/inter-latin-400.woff2", "woff2"),
        ]
    );
    assert_eq!(
        static_face.unicode_range,
        Some(vec!["U+0000-00FF".to_string(), "U+0131".to_string()])
    );

    let variable_face = &result.fonts[1];
    assert_eq!(variable_face.weight, Some(FontWeight::Range(100.0, 900.0)));
    assert_eq!(
        variable_face.src,
        vec![FontSource::remote_with_format(
            "https://cdn.test/fontsource/fonts/inter:vf@latest/latin-wght-normal.woff2",
            "woff2"
        )]
    );
    assert_eq!(
        variable_face.meta.as_ref().and_then(|m| m.subset.as_deref()),
        Some("latin")
    );
}

#[tokio::test]
async fn test_empty_subsets_request_every_subset() {
    let server = MockServer::start().await;
    mock_catalogue(&server).await;

    let (fontsource, _backend) = init(&provider(&server)).await;
    let options = PartialResolveOptions::new()
        .styles([FontStyle::Normal])
        .subsets(Vec::<String>::new())
        .resolve();
    let result = fontsource
        .resolver()
        .resolve_font("Inter", &options)
        .await
        .unwrap()
        .unwrap();
    let subsets: Vec<_> = result
        .fonts
        .iter()
        .map(|f| f.meta.as_ref().and_then(|m| m.subset.clone()))
        .collect();
    assert_eq!(subsets, vec![Some("cyrillic".to_string()), Some("latin".to_string())]);
}

#[tokio::test]
async fn test_missing_variable_axes_skip_the_face() {
    let server = MockServer::start().await;
    mock_catalogue(&server).await;
    Mock::given(method("GET"))
        .and(path("/variable/inter"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (fontsource, _backend) = init(&provider(&server)).await;
    let options = PartialResolveOptions::new()
        .weights(["100 900"])
        .styles([FontStyle::Normal])
        .subsets(["latin"])
        .resolve();
    let result = fontsource
        .resolver()
        .resolve_font("Inter", &options)
        .await
        .unwrap()
        .unwrap();
    assert!(result.fonts.is_empty());
}

#[tokio::test]
async fn test_lists_fonts() {
    let server = MockServer::start().await;
    mock_catalogue(&server).await;

    let (fontsource, _backend) = init(&provider(&server)).await;
    assert_eq!(
        fontsource.lister().unwrap().list_fonts().await.unwrap(),
        Some(vec!["Inter".to_string()])
    );
}
