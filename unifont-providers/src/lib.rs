//! Built-in font providers for unifont.
//!
//! Every provider implements [`Provider`](unifont_core::Provider) and caches
//! its network results through the storage handed to it at initialization.
//!
//! | Provider | Source | Lists fonts |
//! |----------|--------|-------------|
//! | [`google`] | Google Fonts `css2` API | yes |
//! | [`bunny`] | Bunny Fonts | yes |
//! | [`fontshare`] | Fontshare API | no |
//! | [`fontsource`] | Fontsource API and jsDelivr CDN | yes |
//! | [`adobe`] | Adobe Fonts web project kits | yes |
//! | [`googleicons`] | Material Icons / Material Symbols | no |
//! | [`npm`] | Font packages in `node_modules` | yes |
//!
//! API origins can be overridden on each provider (`with_base_url` and
//! friends), which is how the integration tests point them at a mock server.

pub mod adobe;
pub mod bunny;
mod common;
pub mod fetch;
pub mod fontshare;
pub mod fontsource;
pub mod google;
pub mod googleicons;
pub mod npm;

pub use adobe::{AdobeOptions, AdobeProvider, KitIds};
pub use bunny::BunnyProvider;
pub use fetch::{FetchRequest, Fetcher};
pub use fontshare::FontshareProvider;
pub use fontsource::FontsourceProvider;
pub use google::{AxisValue, GoogleFamilyOptions, GoogleOptions, GoogleProvider};
pub use googleicons::{GoogleIconsFamilyOptions, GoogleIconsProvider};
pub use npm::{NpmOptions, NpmProvider};

/// Google Fonts with the given options.
pub fn google(options: GoogleOptions) -> GoogleProvider {
    GoogleProvider::new(options)
}

pub fn bunny() -> BunnyProvider {
    BunnyProvider::new()
}

pub fn fontshare() -> FontshareProvider {
    FontshareProvider::new()
}

pub fn fontsource() -> FontsourceProvider {
    FontsourceProvider::new()
}

/// Adobe Fonts for the given kit ids. Opts out at init when no id is set.
pub fn adobe(options: AdobeOptions) -> AdobeProvider {
    AdobeProvider::new(options)
}

pub fn googleicons() -> GoogleIconsProvider {
    GoogleIconsProvider::new()
}

pub fn npm(options: NpmOptions) -> NpmProvider {
    NpmProvider::new(options)
}
