//! Fonts installed as npm packages in a local `node_modules`.
//!
//! Packages follow the `@fontsource` layout: one `<weight>-<style>.css` file
//! per variant next to the package's `package.json`. Relative font URLs in
//! those files are rewritten to absolute `file://` URLs.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unifont_cache::{CacheKeyFactory, CachedStorage};
use unifont_core::{
    FaceDescriptor, FontSource, InitializedProvider, ListFonts, Provider, ProviderContext,
    ResolveFont, ResolveFontResult, ResolveOptions,
};
use unifont_css::extract_faces;
use url::Url;

use crate::common::data_key;

pub const PROVIDER_NAME: &str = "npm";

/// Dependency names treated as font packages.
static FONT_PACKAGE_REGEX: OnceLock<Regex> = OnceLock::new();

/// `"<Name> font"` hint inside a package description.
static DESCRIPTION_REGEX: OnceLock<Regex> = OnceLock::new();

fn font_package_regex() -> &'static Regex {
    FONT_PACKAGE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^@fontsource/|^@next/font$|^cal-sans$|^geist$|^inter$|^roboto$|font")
            .expect("Failed to compile font package regex")
    })
}

fn description_regex() -> &'static Regex {
    DESCRIPTION_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\b(\w+(?:\s+\w+)?)\s+font").expect("Failed to compile description regex")
    })
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("node_modules")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NpmOptions {
    /// Packages to read. Detected from `package.json` dependencies when empty.
    pub packages: Vec<String>,
    /// Where packages are installed, relative to `workspace_dir`.
    pub base_dir: PathBuf,
    /// Project root. Defaults to the current directory.
    pub workspace_dir: Option<PathBuf>,
}

impl Default for NpmOptions {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            base_dir: default_base_dir(),
            workspace_dir: None,
        }
    }
}

/// Dependencies of the project at `workspace_dir` that look like font
/// packages. Errors are logged and yield no packages.
pub async fn detect_font_packages(workspace_dir: &Path) -> Vec<String> {
    match read_dependencies(workspace_dir).await {
        Ok(dependencies) => dependencies
            .into_iter()
            .filter(|name| font_package_regex().is_match(name))
            .collect(),
        Err(err) => {
            log::error!("Failed to detect font packages: {err:#}");
            Vec::new()
        }
    }
}

async fn read_dependencies(workspace_dir: &Path) -> anyhow::Result<Vec<String>> {
    let manifest: Value =
        serde_json::from_str(&tokio::fs::read_to_string(workspace_dir.join("package.json")).await?)?;
    let mut names: Vec<String> = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(deps) = manifest.get(section).and_then(Value::as_object) {
            for name in deps.keys() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
    }
    Ok(names)
}

/// Family name implied by a package name alone.
pub fn font_name_from_package(package: &str) -> Option<String> {
    if let Some(name) = package.strip_prefix("@fontsource/") {
        return Some(name.replace('-', " "));
    }
    let known = match package {
        "cal-sans" => Some("Cal Sans"),
        "geist" => Some("Geist"),
        "inter" => Some("Inter"),
        "roboto" => Some("Roboto"),
        "@next/font" => Some("System Font"),
        _ => None,
    };
    if let Some(known) = known {
        return Some(known.to_string());
    }
    if package.ends_with("-font") {
        return Some(package.replacen("-font", "", 1).replace('-', " "));
    }
    if package.contains("font-") {
        return Some(package.replacen("font-", "", 1).replace('-', " "));
    }
    None
}

/// Family name of a package: explicit `fontName`/`fontFamily` manifest
/// fields, then naming conventions, then a hint in the description.
pub fn font_family_name(package: &str, manifest: &Value) -> Option<String> {
    for field in ["fontName", "fontFamily"] {
        if let Some(name) = manifest.get(field).and_then(Value::as_str).filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
    }
    if let Some(name) = font_name_from_package(package) {
        return Some(name);
    }
    let description = manifest.get("description").and_then(Value::as_str)?;
    description_regex()
        .captures(description)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn is_relative_url(url: &str) -> bool {
    !(url.starts_with("http") || url.starts_with("file:") || url.starts_with("data:"))
}

/// Point relative sources at files under `package_dir`, keeping the
/// declared URL as `originalURL`.
fn absolutize_sources(face: &mut FaceDescriptor, package_dir: &Path) {
    for source in &mut face.src {
        let FontSource::Remote(remote) = source else {
            continue;
        };
        if !is_relative_url(&remote.url) {
            continue;
        }
        let path = normalize_path(&package_dir.join(&remote.url));
        match Url::from_file_path(&path) {
            Ok(url) => {
                remote.original_url = Some(std::mem::replace(&mut remote.url, url.into()));
            }
            Err(()) => log::debug!("npm: cannot turn {} into a file URL", path.display()),
        }
    }
}

/// The npm provider.
#[derive(Debug, Clone, Default)]
pub struct NpmProvider {
    options: NpmOptions,
}

impl NpmProvider {
    pub fn new(options: NpmOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Provider for NpmProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn options(&self) -> Value {
        serde_json::to_value(&self.options).unwrap_or(Value::Null)
    }

    async fn init(&self, ctx: ProviderContext) -> anyhow::Result<Option<InitializedProvider>> {
        let workspace_dir = match &self.options.workspace_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let base_dir = normalize_path(&workspace_dir.join(&self.options.base_dir));

        let packages = if self.options.packages.is_empty() {
            detect_font_packages(&workspace_dir).await
        } else {
            self.options.packages.clone()
        };

        // Lowercase family name to package.
        let mut families: BTreeMap<String, String> = BTreeMap::new();
        for package in packages {
            let manifest_path = base_dir.join(&package).join("package.json");
            if !tokio::fs::try_exists(&manifest_path).await.unwrap_or(false) {
                continue;
            }
            let manifest = match read_manifest(&manifest_path).await {
                Ok(manifest) => manifest,
                Err(err) => {
                    log::error!("Failed to process package {package}: {err:#}");
                    continue;
                }
            };
            if let Some(family) = font_family_name(&package, &manifest) {
                families.insert(family.to_lowercase(), package);
            }
        }
        log::debug!("npm: {} font packages in {}", families.len(), base_dir.display());
        ctx.storage
            .set_item(&ctx.cache_key.key("font-map"), &families)
            .await?;

        Ok(Some(InitializedProvider::with_list_fonts(Npm {
            base_dir,
            families,
            storage: ctx.storage,
            keys: ctx.cache_key,
        })))
    }
}

async fn read_manifest(path: &Path) -> anyhow::Result<Value> {
    Ok(serde_json::from_str(&tokio::fs::read_to_string(path).await?)?)
}

struct Npm {
    base_dir: PathBuf,
    families: BTreeMap<String, String>,
    storage: CachedStorage,
    keys: CacheKeyFactory,
}

impl Npm {
    async fn read_faces(&self, family: &str, options: &ResolveOptions) -> Vec<FaceDescriptor> {
        let Some(package) = self.families.get(&family.to_lowercase()) else {
            return Vec::new();
        };
        let package_dir = self.base_dir.join(package);

        let mut faces = Vec::new();
        for weight in &options.weights {
            for style in &options.styles {
                let css_path = package_dir.join(format!("{weight}-{style}.css"));
                if !tokio::fs::try_exists(&css_path).await.unwrap_or(false) {
                    continue;
                }
                let css = match tokio::fs::read_to_string(&css_path).await {
                    Ok(css) => css,
                    Err(err) => {
                        log::error!("Failed to process CSS file {}: {err}", css_path.display());
                        continue;
                    }
                };
                for mut face in extract_faces(&css, None) {
                    absolutize_sources(&mut face, &package_dir);
                    face.meta_mut().package = Some(package.clone());
                    faces.push(face);
                }
            }
        }
        faces
    }
}

#[async_trait]
impl ResolveFont for Npm {
    async fn resolve_font(
        &self,
        family: &str,
        options: &ResolveOptions,
    ) -> anyhow::Result<Option<ResolveFontResult>> {
        let key = data_key(&self.keys, family, options);
        if let Some(fonts) = self.storage.get_item::<Vec<FaceDescriptor>>(&key).await? {
            if !fonts.is_empty() {
                return Ok(Some(ResolveFontResult::new(fonts)));
            }
        }

        let fonts = self.read_faces(family, options).await;
        if fonts.is_empty() {
            return Ok(None);
        }
        self.storage.set_item(&key, &fonts).await?;
        Ok(Some(ResolveFontResult::new(fonts)))
    }
}

#[async_trait]
impl ListFonts for Npm {
    async fn list_fonts(&self) -> anyhow::Result<Option<Vec<String>>> {
        Ok(Some(self.families.keys().cloned().collect()))
    }
}
