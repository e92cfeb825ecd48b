use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::core::filters::normalize_material;
use crate::models::MaterialProperties;
use crate::services::defaults;

pub type ParameterMap = BTreeMap<String, f64>;

/// symptom -> category -> explanation
pub type FlightDiagnostics = BTreeMap<String, BTreeMap<String, String>>;

/// Errors that can occur when reaching the configuration store
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Configuration store unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration store timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Failed to read parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parameter groups exposed by the configuration store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterCategory {
    BaseCalculation,
    BowAdjustments,
    ShootingStyleAdjustments,
}

impl ParameterCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterCategory::BaseCalculation => "base_calculation",
            ParameterCategory::BowAdjustments => "bow_adjustments",
            ParameterCategory::ShootingStyleAdjustments => "shooting_style_adjustments",
        }
    }
}

impl fmt::Display for ParameterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of tunable calculation parameters
pub trait ConfigStore: Send + Sync {
    fn get_calculation_parameters(
        &self,
        category: ParameterCategory,
    ) -> Result<ParameterMap, ConfigStoreError>;

    /// All materials, or only the one matching `material` (normalized)
    fn get_material_properties(
        &self,
        material: Option<&str>,
    ) -> Result<BTreeMap<String, MaterialProperties>, ConfigStoreError>;

    fn get_flight_problem_diagnostics(&self) -> Result<FlightDiagnostics, ConfigStoreError>;
}

/// On-disk layout of a parameter file
#[derive(Debug, Default, Deserialize)]
struct ParameterDocument {
    #[serde(default)]
    base_calculation: ParameterMap,
    #[serde(default)]
    bow_adjustments: ParameterMap,
    #[serde(default)]
    shooting_style_adjustments: ParameterMap,
    #[serde(default)]
    materials: BTreeMap<String, MaterialProperties>,
    #[serde(default)]
    flight_problems: FlightDiagnostics,
}

/// Configuration store held in memory, optionally loaded from TOML
///
/// ```toml
/// [base_calculation]
/// draw_weight_factor = 12.5
///
/// [bow_adjustments]
/// recurve_spine_adjustment = 50.0
///
/// [materials.wood]
/// name = "Wood"
/// spine_adjustment_factor = 1.3
/// min_spine_options = 2
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigStore {
    base_calculation: ParameterMap,
    bow_adjustments: ParameterMap,
    shooting_style_adjustments: ParameterMap,
    materials: BTreeMap<String, MaterialProperties>,
    flight_problems: FlightDiagnostics,
}

impl InMemoryConfigStore {
    /// Empty store: every lookup misses and falls back
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the built-in tables
    pub fn with_defaults() -> Self {
        Self {
            base_calculation: defaults::base_calculation(),
            bow_adjustments: defaults::bow_adjustments(),
            shooting_style_adjustments: defaults::shooting_style_adjustments(),
            materials: defaults::materials(),
            flight_problems: defaults::flight_problems(),
        }
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigStoreError> {
        let document: ParameterDocument = toml::from_str(toml_str)?;
        Ok(Self {
            base_calculation: document.base_calculation,
            bow_adjustments: document.bow_adjustments,
            shooting_style_adjustments: document.shooting_style_adjustments,
            materials: document
                .materials
                .into_values()
                .map(|properties| (normalize_material(&properties.name), properties))
                .collect(),
            flight_problems: document.flight_problems,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigStoreError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let store = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded calculation parameters from {}", path.as_ref().display());
        Ok(store)
    }

    pub fn set_parameter(&mut self, category: ParameterCategory, key: impl Into<String>, value: f64) {
        self.category_mut(category).insert(key.into(), value);
    }

    pub fn remove_parameter(&mut self, category: ParameterCategory, key: &str) -> Option<f64> {
        self.category_mut(category).remove(key)
    }

    pub fn set_material(&mut self, properties: MaterialProperties) {
        self.materials.insert(normalize_material(&properties.name), properties);
    }

    fn category_mut(&mut self, category: ParameterCategory) -> &mut ParameterMap {
        match category {
            ParameterCategory::BaseCalculation => &mut self.base_calculation,
            ParameterCategory::BowAdjustments => &mut self.bow_adjustments,
            ParameterCategory::ShootingStyleAdjustments => &mut self.shooting_style_adjustments,
        }
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn get_calculation_parameters(
        &self,
        category: ParameterCategory,
    ) -> Result<ParameterMap, ConfigStoreError> {
        let map = match category {
            ParameterCategory::BaseCalculation => &self.base_calculation,
            ParameterCategory::BowAdjustments => &self.bow_adjustments,
            ParameterCategory::ShootingStyleAdjustments => &self.shooting_style_adjustments,
        };
        Ok(map.clone())
    }

    fn get_material_properties(
        &self,
        material: Option<&str>,
    ) -> Result<BTreeMap<String, MaterialProperties>, ConfigStoreError> {
        match material {
            None => Ok(self.materials.clone()),
            Some(material) => {
                let key = normalize_material(material);
                Ok(self
                    .materials
                    .get(&key)
                    .map(|properties| BTreeMap::from([(key, properties.clone())]))
                    .unwrap_or_default())
            }
        }
    }

    fn get_flight_problem_diagnostics(&self) -> Result<FlightDiagnostics, ConfigStoreError> {
        Ok(self.flight_problems.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameter_file() {
        let toml_str = r#"
            [base_calculation]
            draw_weight_factor = 13.0

            [bow_adjustments]
            recurve_spine_adjustment = 40.0

            [shooting_style_adjustments]
            recurve_barebow = 30.0

            [materials.wood]
            name = "Wood"
            spine_adjustment_factor = 1.25
            min_spine_options = 2

            [flight_problems.nock_left]
            spine = "Too stiff"
        "#;

        let store = InMemoryConfigStore::from_toml_str(toml_str).unwrap();

        let base = store
            .get_calculation_parameters(ParameterCategory::BaseCalculation)
            .unwrap();
        assert_eq!(base["draw_weight_factor"], 13.0);

        let styles = store
            .get_calculation_parameters(ParameterCategory::ShootingStyleAdjustments)
            .unwrap();
        assert_eq!(styles["recurve_barebow"], 30.0);

        let wood = store.get_material_properties(Some("WOOD")).unwrap();
        assert_eq!(wood["wood"].min_spine_options, 2);

        let problems = store.get_flight_problem_diagnostics().unwrap();
        assert_eq!(problems["nock_left"]["spine"], "Too stiff");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = InMemoryConfigStore::from_toml_str("[base_calculation\n").unwrap_err();
        assert!(matches!(err, ConfigStoreError::Parse(_)));
    }

    #[test]
    fn test_material_lookup_normalizes() {
        let store = InMemoryConfigStore::with_defaults();

        let hybrid = store.get_material_properties(Some("carbon-aluminum")).unwrap();
        assert_eq!(hybrid.len(), 1);
        assert!(hybrid.values().all(|p| p.name == "Carbon/Aluminum"));

        let missing = store.get_material_properties(Some("unobtainium")).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ParameterCategory::BaseCalculation.to_string(), "base_calculation");
        assert_eq!(ParameterCategory::BowAdjustments.as_str(), "bow_adjustments");
        assert_eq!(
            ParameterCategory::ShootingStyleAdjustments.as_str(),
            "shooting_style_adjustments"
        );
    }
}
