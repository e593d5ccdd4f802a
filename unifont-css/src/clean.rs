use std::collections::HashMap;

use unifont_core::{FaceDescriptor, FontFormat, FontSource, canonical_format};

/// Normalize faces gathered from one or more fetches.
///
/// Remote formats are rewritten to their canonical CSS names and sources in
/// a format outside `formats` are dropped; local sources and sources without
/// a format always survive. Faces left without sources are discarded, and
/// faces equal in every field but `src` and `meta` are folded into the first
/// one, whose `meta` wins.
pub fn clean_faces(faces: Vec<FaceDescriptor>, formats: &[FontFormat]) -> Vec<FaceDescriptor> {
    let allowed: Vec<&str> = formats.iter().map(|f| f.css_name()).collect();
    let mut result: Vec<FaceDescriptor> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for mut face in faces {
        let sources: Vec<FontSource> = std::mem::take(&mut face.src)
            .into_iter()
            .map(canonicalize)
            .filter(|source| is_allowed(source, &allowed))
            .collect();
        if sources.is_empty() {
            continue;
        }

        let key = face.merge_key();
        match index_by_key.get(&key) {
            Some(&index) => result[index].extend_sources(sources),
            None => {
                face.src = sources;
                index_by_key.insert(key, result.len());
                result.push(face);
            }
        }
    }

    result
}

fn canonicalize(source: FontSource) -> FontSource {
    match source {
        FontSource::Remote(mut remote) => {
            remote.format = remote.format.map(|format| canonical_format(&format));
            FontSource::Remote(remote)
        }
        local => local,
    }
}

fn is_allowed(source: &FontSource, allowed: &[&str]) -> bool {
    match source.format() {
        None | Some("") => true,
        Some(format) => allowed.contains(&format),
    }
}
