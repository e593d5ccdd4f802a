//! Weight, style and subset resolution against provider capabilities.

use std::collections::HashSet;

use crate::options::FontStyle;

/// A weight to request from a provider.
///
/// `variable` is true for range tokens (`"100 900"`), which are only ever
/// kept when the provider exposes a variable weight axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedWeight {
    pub weight: String,
    pub variable: bool,
}

/// Map requested weight tokens onto what a provider can serve.
///
/// - A range token is kept verbatim when `has_variable_weights`, otherwise it
///   expands to every discrete `provider_weights` entry inside `[min, max]`.
/// - A single token is kept only if it is one of `provider_weights`.
///
/// The result is deduplicated, preserving first occurrence.
pub fn prepare_weights<S1, S2>(
    input_weights: &[S1],
    provider_weights: &[S2],
    has_variable_weights: bool,
) -> Vec<PreparedWeight>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    let mut collected: Vec<String> = Vec::new();

    for weight in input_weights {
        let weight = weight.as_ref();
        if weight.contains(' ') {
            if has_variable_weights {
                collected.push(weight.to_string());
                continue;
            }
            let Some((min, max)) = parse_range(weight) else {
                continue;
            };
            collected.extend(
                provider_weights
                    .iter()
                    .map(AsRef::as_ref)
                    .filter(|w| w.trim().parse::<f64>().is_ok_and(|w| w >= min && w <= max))
                    .map(str::to_string),
            );
            continue;
        }
        if provider_weights.iter().any(|w| w.as_ref() == weight) {
            collected.push(weight.to_string());
        }
    }

    let mut seen = HashSet::new();
    collected
        .into_iter()
        .filter(|w| seen.insert(w.clone()))
        .map(|weight| PreparedWeight {
            variable: weight.contains(' '),
            weight,
        })
        .collect()
}

fn parse_range(token: &str) -> Option<(f64, f64)> {
    let mut parts = token.split_whitespace();
    let min = parts.next()?.parse().ok()?;
    let max = parts.next()?.parse().ok()?;
    Some((min, max))
}

/// Requested styles the provider declares, in request order.
pub fn filter_styles(requested: &[FontStyle], available: &[FontStyle]) -> Vec<FontStyle> {
    requested
        .iter()
        .copied()
        .filter(|s| available.contains(s))
        .collect()
}

/// Requested subsets the provider declares, in request order. An empty
/// request means no filtering: every available subset is returned.
pub fn filter_subsets<S1, S2>(requested: &[S1], available: &[S2]) -> Vec<String>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    if requested.is_empty() {
        return available.iter().map(|s| s.as_ref().to_string()).collect();
    }
    requested
        .iter()
        .map(AsRef::as_ref)
        .filter(|s| available.iter().any(|a| a.as_ref() == *s))
        .map(str::to_string)
        .collect()
}
