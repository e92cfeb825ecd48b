use std::cmp::Ordering;

use crate::models::requests::DEFAULT_MIN_SPINE_OPTIONS;
use crate::models::{ArrowProduct, SpineSpecification};

/// Canonical material key: lowercase words joined by `/`
///
/// Whitespace, hyphens and slashes all separate words, so
/// `"Carbon / Aluminum"`, `"carbon-aluminum"`, `"carbon aluminum"` and
/// `"CARBON/ALUMINUM"` all become `"carbon/aluminum"`.
pub fn normalize_material(material: &str) -> String {
    material
        .split(|c: char| c.is_whitespace() || c == '-' || c == '/')
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("/")
}

/// Case-insensitive substring match of a material preference
#[inline]
pub fn matches_material(product_material: &str, preference: Option<&str>) -> bool {
    match preference {
        None => true,
        Some(preference) => {
            let preference = normalize_material(preference);
            preference.is_empty() || normalize_material(product_material).contains(&preference)
        }
    }
}

/// Spine-option threshold for one request
///
/// A material that only comes in coarse spine steps (wood) carries a relaxed
/// minimum, below the stock three options, which replaces the requested one.
/// Any other material leaves the request alone. Never below 1.
#[inline]
pub fn effective_min_spine_options(requested: usize, material_minimum: Option<usize>) -> usize {
    match material_minimum {
        Some(minimum) if minimum < DEFAULT_MIN_SPINE_OPTIONS => minimum,
        _ => requested,
    }
    .max(1)
}

#[inline]
pub fn has_enough_spine_options(product: &ArrowProduct, threshold: usize) -> bool {
    product.spine_option_count() >= threshold
}

/// Variant closest to the calculated spine
///
/// Ties on distance go to the diameter nearer `reference_diameter`, then to
/// the weaker (higher) spine.
pub fn select_specification(
    specifications: &[SpineSpecification],
    calculated_spine: f64,
    reference_diameter: f64,
) -> Option<&SpineSpecification> {
    specifications.iter().min_by(|a, b| {
        let deviation = |spec: &SpineSpecification| (f64::from(spec.spine) - calculated_spine).abs();
        let diameter_gap = |spec: &SpineSpecification| (spec.outer_diameter - reference_diameter).abs();

        deviation(a)
            .partial_cmp(&deviation(b))
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                diameter_gap(a)
                    .partial_cmp(&diameter_gap(b))
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| b.spine.cmp(&a.spine))
    })
}
