//! Core types for unifont.
//!
//! This crate provides:
//! - The `@font-face` data model ([`FaceDescriptor`], [`FontSource`], [`FontWeight`])
//! - Resolution options and their documented defaults ([`ResolveOptions`])
//! - Weight, style and subset resolution against a provider's capabilities
//! - The provider capability contract ([`Provider`], [`ResolveFont`], [`ListFonts`])

pub mod face;
pub mod format;
pub mod options;
pub mod provider;
pub mod weights;

pub use face::{FaceDescriptor, FaceMeta, FetchInit, FontSource, FontWeight, LocalSource, RemoteSource, SourceId};
pub use format::{FontFormat, canonical_format, format_priority};
pub use options::{DEFAULT_SUBSETS, FontStyle, PartialResolveOptions, ResolveOptions};
pub use provider::{
    FnProvider, InitializedProvider, ListFonts, Provider, ProviderContext, ResolveFont,
    ResolveFontResult, define_provider,
};
pub use weights::{PreparedWeight, filter_styles, filter_subsets, prepare_weights};
