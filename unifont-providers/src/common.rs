//! Helpers shared by the CSS-serving providers.

use unifont_cache::CacheKeyFactory;
use unifont_core::{FaceDescriptor, ResolveOptions};
use unifont_css::{extract_faces, split_css_into_subsets};

/// Cache key of a resolved family: `<provider>:<hash>-<family>-<hash(options)>-data.json`.
pub(crate) fn data_key(keys: &CacheKeyFactory, family: &str, options: &ResolveOptions) -> String {
    keys.key_with("data.json", |parts| parts.join(&[&family, &parts.hash(options)]))
}

/// Extract faces from a subset-annotated stylesheet, skipping subsets that
/// were not requested and tagging each face with its subset and `priority`.
pub(crate) fn faces_by_subset(
    css: &str,
    options: &ResolveOptions,
    priority: Option<u32>,
) -> Vec<FaceDescriptor> {
    split_css_into_subsets(css)
        .into_iter()
        .filter(|group| group.subset.as_deref().is_none_or(|subset| options.wants_subset(subset)))
        .flat_map(|group| {
            let subset = group.subset;
            extract_faces(&group.css, None)
                .into_iter()
                .map(move |mut face| {
                    if let Some(priority) = priority {
                        face.meta_mut().priority = Some(priority);
                    }
                    if let Some(subset) = &subset {
                        face.meta_mut().subset = Some(subset.clone());
                    }
                    face
                })
        })
        .collect()
}
