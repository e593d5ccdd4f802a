//! Orchestrator behavior: provider ordering, fallthrough, listing and the
//! error policy, exercised with scripted in-process providers.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use unifont::{
    ErrorPolicy, FaceDescriptor, FontSource, InitializedProvider, ListFonts, MemoryStorage,
    PartialResolveOptions, Provider, ResolveFont, ResolveFontResult, ResolveOptions, Unifont,
    UnifontError, UnifontOptions, create_unifont, define_provider,
};

#[derive(Clone)]
enum Outcome<T> {
    Found(T),
    Missing,
    Fail,
}

#[derive(Clone)]
struct Scripted {
    resolve: Outcome<Vec<FaceDescriptor>>,
    list: Outcome<Vec<String>>,
    seen: Arc<Mutex<Vec<ResolveOptions>>>,
}

impl Scripted {
    fn resolving(fonts: Vec<FaceDescriptor>) -> Self {
        Self {
            resolve: Outcome::Found(fonts),
            list: Outcome::Missing,
            seen: Arc::default(),
        }
    }

    fn missing() -> Self {
        Self {
            resolve: Outcome::Missing,
            list: Outcome::Missing,
            seen: Arc::default(),
        }
    }

    fn failing() -> Self {
        Self {
            resolve: Outcome::Fail,
            list: Outcome::Fail,
            seen: Arc::default(),
        }
    }

    fn listing(mut self, names: &[&str]) -> Self {
        self.list = Outcome::Found(names.iter().map(|s| s.to_string()).collect());
        self
    }
}

#[async_trait]
impl ResolveFont for Scripted {
    async fn resolve_font(
        &self,
        _family: &str,
        options: &ResolveOptions,
    ) -> anyhow::Result<Option<ResolveFontResult>> {
        self.seen.lock().push(options.clone());
        match &self.resolve {
            Outcome::Found(fonts) => Ok(Some(ResolveFontResult::new(fonts.clone()))),
            Outcome::Missing => Ok(None),
            Outcome::Fail => anyhow::bail!("upstream returned 500"),
        }
    }
}

#[async_trait]
impl ListFonts for Scripted {
    async fn list_fonts(&self) -> anyhow::Result<Option<Vec<String>>> {
        match &self.list {
            Outcome::Found(names) => Ok(Some(names.clone())),
            Outcome::Missing => Ok(None),
            Outcome::Fail => anyhow::bail!("listing unavailable"),
        }
    }
}

fn provider(name: &str, scripted: Scripted) -> Box<dyn Provider> {
    Box::new(define_provider(name, &(), move |_ctx| {
        let scripted = scripted.clone();
        async move { Ok::<_, anyhow::Error>(Some(InitializedProvider::with_list_fonts(scripted))) }
    }))
}

fn resolve_only(name: &str, scripted: Scripted) -> Box<dyn Provider> {
    Box::new(define_provider(name, &(), move |_ctx| {
        let scripted = scripted.clone();
        async move { Ok::<_, anyhow::Error>(Some(InitializedProvider::new(scripted))) }
    }))
}

fn opting_out(name: &str) -> Box<dyn Provider> {
    Box::new(define_provider(name, &(), |_ctx| async {
        Ok::<_, anyhow::Error>(None)
    }))
}

fn failing_init(name: &str) -> Box<dyn Provider> {
    Box::new(define_provider(name, &(), |_ctx| async {
        Err::<Option<InitializedProvider>, _>(anyhow::anyhow!("missing credentials"))
    }))
}

fn face(name: &str) -> FaceDescriptor {
    FaceDescriptor::new(vec![FontSource::local(name)])
}

fn throwing() -> UnifontOptions {
    UnifontOptions::default().with_error_policy(ErrorPolicy::Propagate)
}

#[tokio::test]
async fn test_first_provider_with_an_answer_wins() {
    let unifont = Unifont::new(
        vec![
            provider("a", Scripted::missing()),
            provider("b", Scripted::resolving(vec![face("From B")])),
            provider("c", Scripted::resolving(vec![face("From C")])),
        ],
        UnifontOptions::default(),
    )
    .await
    .unwrap();

    let result = unifont
        .resolve_font("Poppins", PartialResolveOptions::new(), None)
        .await
        .unwrap();
    assert_eq!(result.provider.as_deref(), Some("b"));
    assert_eq!(result.fonts, vec![face("From B")]);
}

#[tokio::test]
async fn test_empty_answer_still_wins() {
    let unifont = Unifont::new(
        vec![
            provider("a", Scripted::missing()),
            provider("b", Scripted::resolving(vec![])),
            provider("c", Scripted::resolving(vec![face("From C")])),
        ],
        UnifontOptions::default(),
    )
    .await
    .unwrap();

    let result = unifont
        .resolve_font("Poppins", PartialResolveOptions::new(), None)
        .await
        .unwrap();
    assert_eq!(result.provider.as_deref(), Some("b"));
    assert!(result.fonts.is_empty());
}

#[tokio::test]
async fn test_unknown_family_yields_empty_result() {
    let unifont = Unifont::new(
        vec![provider("a", Scripted::missing())],
        UnifontOptions::default(),
    )
    .await
    .unwrap();

    let result = unifont
        .resolve_font("Nope", PartialResolveOptions::new(), None)
        .await
        .unwrap();
    assert!(result.fonts.is_empty());
    assert!(result.provider.is_none());
}

#[tokio::test]
async fn test_provider_receives_defaulted_options() {
    let scripted = Scripted::resolving(vec![]);
    let seen = scripted.seen.clone();
    let unifont = create_unifont(vec![provider("a", scripted)], UnifontOptions::default())
        .await
        .unwrap();

    unifont
        .resolve_font(
            "Poppins",
            PartialResolveOptions::new().subsets(["latin"]),
            None,
        )
        .await
        .unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].weights, vec!["400"]);
    assert_eq!(seen[0].subsets, vec!["latin"]);
    assert_eq!(seen[0].styles, ResolveOptions::default().styles);
}

#[tokio::test]
async fn test_declaration_order_survives_concurrent_init() {
    let slow: Box<dyn Provider> = Box::new(define_provider("slow", &(), |_ctx| async {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        Ok::<_, anyhow::Error>(Some(InitializedProvider::new(Scripted::missing())))
    }));
    let unifont = Unifont::new(
        vec![
            slow,
            opting_out("absent"),
            provider("fast", Scripted::missing()),
        ],
        UnifontOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(unifont.providers(), vec!["slow", "fast"]);
}

#[tokio::test]
async fn test_failed_init_is_dropped_when_logging() {
    let unifont = Unifont::new(
        vec![failing_init("broken"), provider("ok", Scripted::missing())],
        UnifontOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(unifont.providers(), vec!["ok"]);
}

#[tokio::test]
async fn test_failed_init_propagates_when_throwing() {
    let err = Unifont::new(
        vec![failing_init("broken"), provider("ok", Scripted::missing())],
        throwing(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, UnifontError::ProviderInit { ref provider, .. } if provider == "broken"));
    assert!(err.to_string().starts_with("Could not initialize provider `broken`."));
}

#[tokio::test]
async fn test_resolve_error_falls_through_when_logging() {
    let unifont = Unifont::new(
        vec![
            provider("broken", Scripted::failing()),
            provider("ok", Scripted::resolving(vec![face("Ok")])),
        ],
        UnifontOptions::default(),
    )
    .await
    .unwrap();

    let result = unifont
        .resolve_font("Poppins", PartialResolveOptions::new(), None)
        .await
        .unwrap();
    assert_eq!(result.provider.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_resolve_error_propagates_when_throwing() {
    let unifont = Unifont::new(
        vec![
            provider("broken", Scripted::failing()),
            provider("ok", Scripted::resolving(vec![face("Ok")])),
        ],
        throwing(),
    )
    .await
    .unwrap();

    let err = unifont
        .resolve_font("Poppins", PartialResolveOptions::new(), None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not resolve font face for `Poppins` from `broken` provider."
    );
}

#[tokio::test]
async fn test_explicit_provider_list_sets_order() {
    let unifont = Unifont::new(
        vec![
            provider("a", Scripted::resolving(vec![face("A")])),
            provider("b", Scripted::resolving(vec![face("B")])),
        ],
        UnifontOptions::default(),
    )
    .await
    .unwrap();

    let result = unifont
        .resolve_font("Poppins", PartialResolveOptions::new(), Some(&["b", "a"][..]))
        .await
        .unwrap();
    assert_eq!(result.provider.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_unknown_provider_id() {
    let providers = || vec![provider("a", Scripted::resolving(vec![face("A")]))];

    let logging = Unifont::new(providers(), UnifontOptions::default())
        .await
        .unwrap();
    let result = logging
        .resolve_font("Poppins", PartialResolveOptions::new(), Some(&["zzz", "a"][..]))
        .await
        .unwrap();
    assert_eq!(result.provider.as_deref(), Some("a"));

    let strict = Unifont::new(providers(), throwing()).await.unwrap();
    let err = strict
        .resolve_font("Poppins", PartialResolveOptions::new(), Some(&["zzz"][..]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Could not find `zzz` provider.");
}

#[tokio::test]
async fn test_list_fonts_concatenates_in_order() {
    let unifont = Unifont::new(
        vec![
            provider("a", Scripted::missing().listing(&["Roboto", "Lato"])),
            resolve_only("b", Scripted::missing()),
            provider("c", Scripted::missing().listing(&["Inter"])),
        ],
        UnifontOptions::default(),
    )
    .await
    .unwrap();

    let names = unifont.list_fonts(None).await.unwrap();
    assert_eq!(
        names,
        Some(vec!["Roboto".to_string(), "Lato".to_string(), "Inter".to_string()])
    );

    let only_c = unifont.list_fonts(Some(&["c"][..])).await.unwrap();
    assert_eq!(only_c, Some(vec!["Inter".to_string()]));
}

#[tokio::test]
async fn test_list_fonts_none_versus_empty() {
    let nothing = Unifont::new(
        vec![
            provider("a", Scripted::missing()),
            resolve_only("b", Scripted::missing()),
        ],
        UnifontOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(nothing.list_fonts(None).await.unwrap(), None);

    let empty = Unifont::new(
        vec![provider("a", Scripted::missing().listing(&[]))],
        UnifontOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(empty.list_fonts(None).await.unwrap(), Some(vec![]));
}

#[tokio::test]
async fn test_list_error_follows_policy() {
    let providers = || {
        vec![
            provider("broken", Scripted::failing()),
            provider("ok", Scripted::missing().listing(&["Inter"])),
        ]
    };

    let logging = Unifont::new(providers(), UnifontOptions::default())
        .await
        .unwrap();
    assert_eq!(
        logging.list_fonts(None).await.unwrap(),
        Some(vec!["Inter".to_string()])
    );

    let strict = Unifont::new(providers(), throwing()).await.unwrap();
    let err = strict.list_fonts(None).await.unwrap_err();
    assert_eq!(err.to_string(), "Could not list names from `broken` provider.");
}

#[tokio::test]
async fn test_providers_share_a_backend_without_colliding() {
    let writer = |version: u32| -> Box<dyn Provider> {
        Box::new(define_provider(
            "same",
            &json!({ "version": version }),
            move |ctx| async move {
                ctx.storage
                    .set_item(&ctx.cache_key.key("marker"), &version)
                    .await?;
                let read: Option<u32> = ctx.storage.get_item(&ctx.cache_key.key("marker")).await?;
                anyhow::ensure!(read == Some(version), "saw another provider's entry");
                Ok::<_, anyhow::Error>(Some(InitializedProvider::new(Scripted::missing())))
            },
        ))
    };

    let backend = Arc::new(MemoryStorage::new());
    let unifont = Unifont::new(
        vec![writer(1), writer(2)],
        throwing().with_storage(backend.clone()),
    )
    .await
    .unwrap();

    assert_eq!(unifont.providers(), vec!["same", "same"]);
    let keys = backend.keys();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|key| key.starts_with("same:")));
    assert_ne!(keys[0], keys[1]);
}

#[tokio::test]
async fn test_works_with_no_providers() {
    let unifont = Unifont::new(vec![], throwing()).await.unwrap();
    assert!(unifont.providers().is_empty());

    let result = unifont
        .resolve_font("Poppins", PartialResolveOptions::new(), None)
        .await
        .unwrap();
    assert!(result.fonts.is_empty());
    assert!(result.provider.is_none());

    assert_eq!(unifont.list_fonts(None).await.unwrap(), None);
}

#[tokio::test]
async fn test_entries_are_stamped_with_the_library_version() {
    let stamping: Box<dyn Provider> = Box::new(define_provider("stamp", &(), |ctx| async move {
        ctx.storage.set_item(&ctx.cache_key.key("meta.json"), &["Inter"]).await?;
        Ok::<_, anyhow::Error>(Some(InitializedProvider::new(Scripted::missing())))
    }));

    let backend = Arc::new(MemoryStorage::new());
    Unifont::new(vec![stamping], throwing().with_storage(backend.clone()))
        .await
        .unwrap();

    let keys = backend.keys();
    assert_eq!(keys.len(), 1);
    let raw = unifont::Storage::get_item(backend.as_ref(), &keys[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw["schemaVersion"], json!(unifont::VERSION));
    assert_eq!(raw["data"], json!(["Inter"]));
}
