// Library entry point for unifont.
//
// # Crate layout
//
//   - `unifont-cache`     : cache keys, raw storage backends and the TTL/version
//                           aware `CachedStorage` handed to providers.
//   - `unifont-core`      : the `@font-face` data model, resolution options and
//                           the provider contract.
//   - `unifont-css`       : `@font-face` extraction, normalization and subset
//                           splitting.
//   - `unifont-providers` : the built-in providers.
//
// This crate owns the orchestrator (`Unifont`) and re-exports the pieces a
// caller needs so that depending on `unifont` alone is enough.

/// Library version (root crate version, for use by sub-crates).
/// Sub-crates receive this via parameter rather than using
/// `env!("CARGO_PKG_VERSION")` which resolves to the sub-crate's version.
/// It is the default schema version of cache entries.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod error;
mod options;
mod unifont;

pub use error::{BoxError, ErrorPolicy, UnifontError};
pub use options::UnifontOptions;
pub use unifont::{Unifont, create_unifont};

pub use unifont_cache::{
    CacheConfig, CacheError, CacheKeyFactory, CachedStorage, FsStorage, MemoryStorage, Storage,
};
pub use unifont_core::{
    DEFAULT_SUBSETS, FaceDescriptor, FaceMeta, FetchInit, FontFormat, FontSource, FontStyle,
    FontWeight, InitializedProvider, ListFonts, LocalSource, PartialResolveOptions, Provider,
    ProviderContext, RemoteSource, ResolveFont, ResolveFontResult, ResolveOptions,
    define_provider,
};
pub use unifont_css::{clean_faces, extract_faces, split_css_into_subsets};

pub mod providers {
    //! Built-in providers re-exported from the unifont-providers crate.
    pub use unifont_providers::*;
}
