//! CSS handling for unifont.
//!
//! - [`extract_faces`] turns stylesheet text into merged [`FaceDescriptor`]s
//! - [`clean_faces`] canonicalizes formats, filters sources and folds
//!   descriptors gathered from several fetches
//! - [`split_css_into_subsets`] cuts a stylesheet into `@font-face` groups
//!   tagged by their `/* subset */` comments
//!
//! [`FaceDescriptor`]: unifont_core::FaceDescriptor

mod clean;
mod extract;
mod subsets;

pub use clean::clean_faces;
pub use extract::extract_faces;
pub use subsets::{SubsetCss, split_css_into_subsets};
