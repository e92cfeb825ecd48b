//! Built-in calculation tables, served whenever the configuration store is
//! down or missing a key.

use std::collections::BTreeMap;

use crate::core::formula::SpineFormula;
use crate::models::{BowType, MaterialProperties};
use crate::services::config_store::{FlightDiagnostics, ParameterMap};

pub const DRAW_WEIGHT_FACTOR: &str = "draw_weight_factor";
pub const LENGTH_ADJUSTMENT_FACTOR: &str = "length_adjustment_factor";
pub const POINT_WEIGHT_FACTOR: &str = "point_weight_factor";
pub const REFERENCE_LENGTH: &str = "reference_length";
pub const REFERENCE_POINT_WEIGHT: &str = "reference_point_weight";
pub const SPINE_TOLERANCE: &str = "spine_tolerance";
pub const MATERIAL_ADJUSTMENT_SCALE: &str = "material_adjustment_scale";

/// ±25 spine around the 625 reference case
pub const DEFAULT_SPINE_TOLERANCE: f64 = 0.04;
pub const DEFAULT_MATERIAL_ADJUSTMENT_SCALE: f64 = 100.0;
pub const DEFAULT_REFERENCE_DIAMETER: f64 = 0.246;

pub fn bow_adjustment_key(bow_type: BowType) -> String {
    format!("{}_spine_adjustment", bow_type.as_str())
}

pub fn reference_diameter_key(bow_type: BowType) -> String {
    format!("{}_reference_diameter", bow_type.as_str())
}

pub fn shooting_style_key(bow_type: BowType, style: &str) -> String {
    let style: String = style
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect();
    format!("{}_{}", bow_type.as_str(), style)
}

pub fn base_calculation() -> ParameterMap {
    let formula = SpineFormula::default();
    BTreeMap::from([
        (DRAW_WEIGHT_FACTOR.to_string(), formula.draw_weight_factor),
        (LENGTH_ADJUSTMENT_FACTOR.to_string(), formula.length_adjustment_factor),
        (POINT_WEIGHT_FACTOR.to_string(), formula.point_weight_factor),
        (REFERENCE_LENGTH.to_string(), formula.reference_length),
        (REFERENCE_POINT_WEIGHT.to_string(), formula.reference_point_weight),
        (SPINE_TOLERANCE.to_string(), DEFAULT_SPINE_TOLERANCE),
        (MATERIAL_ADJUSTMENT_SCALE.to_string(), DEFAULT_MATERIAL_ADJUSTMENT_SCALE),
    ])
}

/// Spine offset per bow type plus the shaft diameter each bow type
/// typically shoots
pub fn bow_adjustments() -> ParameterMap {
    let offsets = [
        (BowType::Compound, 0.0, DEFAULT_REFERENCE_DIAMETER),
        (BowType::Recurve, 50.0, 0.204),
        (BowType::Barebow, 50.0, 0.230),
        (BowType::Traditional, 100.0, 0.300),
        (BowType::Longbow, 100.0, 0.320),
    ];

    offsets
        .into_iter()
        .flat_map(|(bow_type, offset, diameter)| {
            [
                (bow_adjustment_key(bow_type), offset),
                (reference_diameter_key(bow_type), diameter),
            ]
        })
        .collect()
}

pub fn shooting_style_adjustments() -> ParameterMap {
    BTreeMap::from([
        (shooting_style_key(BowType::Recurve, "barebow"), 25.0),
        (shooting_style_key(BowType::Recurve, "olympic"), -25.0),
        (shooting_style_key(BowType::Barebow, "string_walking"), 15.0),
        (shooting_style_key(BowType::Traditional, "traditional"), 25.0),
        (shooting_style_key(BowType::Traditional, "standard"), 0.0),
        (shooting_style_key(BowType::Longbow, "traditional"), 25.0),
        (shooting_style_key(BowType::Compound, "hunting"), -10.0),
    ])
}

/// Keyed by normalized material name
pub fn materials() -> BTreeMap<String, MaterialProperties> {
    let table = [
        ("Carbon", 1.6, 230.0, 1.0, 1.0, 3, "High-performance carbon fiber arrows with excellent consistency", "Target and hunting"),
        ("Aluminum", 2.7, 69.0, 0.85, 0.95, 3, "Durable aluminum arrows with good straightness", "Target and recreational"),
        ("Carbon/Aluminum", 2.0, 150.0, 0.95, 0.98, 3, "Hybrid construction combining carbon and aluminum", "Hunting and target"),
        ("Wood", 0.6, 12.0, 0.7, 1.3, 2, "Traditional wooden arrows with natural variability", "Traditional archery"),
        ("Fiberglass", 1.8, 38.0, 0.8, 1.1, 3, "Economic fiberglass arrows for beginners", "Recreational"),
    ];

    table
        .into_iter()
        .map(|(name, density, elasticity, strength, spine_factor, min_options, description, typical_use)| {
            (
                crate::core::filters::normalize_material(name),
                MaterialProperties {
                    name: name.to_string(),
                    density: Some(density),
                    elasticity_modulus: Some(elasticity),
                    strength_factor: Some(strength),
                    spine_adjustment_factor: spine_factor,
                    min_spine_options: min_options,
                    description: Some(description.to_string()),
                    typical_use: Some(typical_use.to_string()),
                },
            )
        })
        .collect()
}

/// symptom -> category -> explanation
pub fn flight_problems() -> FlightDiagnostics {
    let table: [(&str, &[(&str, &str)]); 4] = [
        (
            "nock_left",
            &[
                ("spine", "Arrow too stiff for a right-handed archer; try a weaker spine or heavier point"),
                ("rest", "Rest may be too far out; move center shot inward"),
            ],
        ),
        (
            "nock_right",
            &[
                ("spine", "Arrow too weak for a right-handed archer; try a stiffer spine or lighter point"),
                ("rest", "Rest may be too far in; move center shot outward"),
            ],
        ),
        (
            "nock_high",
            &[
                ("nocking_point", "Nocking point too high; lower it in small steps"),
                ("clearance", "Fletching may be contacting the rest"),
            ],
        ),
        (
            "porpoising",
            &[
                ("nocking_point", "Vertical nock travel; adjust nocking point height"),
                ("spine", "Severely mismatched spine can show as vertical oscillation"),
            ],
        ),
    ];

    table
        .into_iter()
        .map(|(symptom, entries)| {
            let categories = entries
                .iter()
                .map(|(category, explanation)| (category.to_string(), explanation.to_string()))
                .collect();
            (symptom.to_string(), categories)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_bow_type_has_defaults() {
        let table = bow_adjustments();
        for bow_type in BowType::ALL {
            assert!(table.contains_key(&bow_adjustment_key(bow_type)), "{bow_type} offset");
            assert!(table.contains_key(&reference_diameter_key(bow_type)), "{bow_type} diameter");
        }
        assert_eq!(table[&bow_adjustment_key(BowType::Compound)], 0.0);
    }

    #[test]
    fn test_shooting_style_key_normalization() {
        assert_eq!(shooting_style_key(BowType::Recurve, " Olympic "), "recurve_olympic");
        assert_eq!(shooting_style_key(BowType::Barebow, "String-Walking"), "barebow_string_walking");
        assert_eq!(shooting_style_key(BowType::Barebow, "string walking"), "barebow_string_walking");
    }

    #[test]
    fn test_wood_relaxed_threshold() {
        let table = materials();
        assert_eq!(table["wood"].min_spine_options, 2);
        assert_eq!(table["carbon"].min_spine_options, 3);
        assert!(table["wood"].spine_adjustment_factor > table["carbon"].spine_adjustment_factor);
    }
}
