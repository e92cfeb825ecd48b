use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::{Validate, ValidationError};

use crate::models::domain::{ArcherProfile, TuningGoal};

/// Request to find arrows for an archer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_ranges"))]
pub struct MatchRequest {
    pub archer_profile: ArcherProfile,
    #[validate(range(exclusive_min = 0.0, max = 40.0))]
    pub arrow_length: f64,
    #[serde(default = "default_point_weight")]
    #[validate(range(exclusive_min = 0.0, max = 1000.0))]
    pub point_weight: f64,
    #[serde(default = "default_nock_weight")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub nock_weight: f64,
    #[serde(default = "default_fletching_weight")]
    #[validate(range(min = 0.0, max = 200.0))]
    pub fletching_weight: f64,
    #[serde(default = "default_insert_weight")]
    #[validate(range(min = 0.0, max = 200.0))]
    pub insert_weight: f64,
    #[serde(default)]
    pub tuning_goals: BTreeSet<TuningGoal>,
    #[serde(default)]
    pub material_preference: Option<String>,
    #[serde(default = "default_min_spine_options")]
    #[validate(range(min = 1))]
    pub min_spine_options: usize,
    #[serde(default)]
    pub preferred_manufacturers: Vec<String>,
    /// Inches, inclusive
    #[serde(default)]
    pub target_diameter_range: Option<(f64, f64)>,
    /// FOC percent, inclusive
    #[serde(default)]
    pub target_foc_range: Option<(f64, f64)>,
    #[serde(default = "default_max_results")]
    #[validate(range(min = 1, max = 100))]
    pub max_results: usize,
}

fn default_point_weight() -> f64 {
    125.0
}

fn default_nock_weight() -> f64 {
    10.0
}

fn default_fletching_weight() -> f64 {
    15.0
}

fn default_insert_weight() -> f64 {
    15.0
}

/// Spine options a product needs unless a material relaxes it
pub const DEFAULT_MIN_SPINE_OPTIONS: usize = 3;

fn default_min_spine_options() -> usize {
    DEFAULT_MIN_SPINE_OPTIONS
}

fn default_max_results() -> usize {
    20
}

fn validate_ranges(request: &MatchRequest) -> Result<(), ValidationError> {
    let ordered = |range: Option<(f64, f64)>| match range {
        Some((low, high)) => low.is_finite() && high.is_finite() && low <= high,
        None => true,
    };

    if !ordered(request.target_diameter_range) {
        return Err(ValidationError::new("target_diameter_range"));
    }
    if !ordered(request.target_foc_range) {
        return Err(ValidationError::new("target_foc_range"));
    }
    Ok(())
}

impl MatchRequest {
    pub fn new(archer_profile: ArcherProfile, arrow_length: f64) -> Self {
        Self {
            archer_profile,
            arrow_length,
            point_weight: default_point_weight(),
            nock_weight: default_nock_weight(),
            fletching_weight: default_fletching_weight(),
            insert_weight: default_insert_weight(),
            tuning_goals: BTreeSet::new(),
            material_preference: None,
            min_spine_options: default_min_spine_options(),
            preferred_manufacturers: Vec::new(),
            target_diameter_range: None,
            target_foc_range: None,
            max_results: default_max_results(),
        }
    }

    pub fn with_point_weight(mut self, point_weight: f64) -> Self {
        self.point_weight = point_weight;
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material_preference = Some(material.into());
        self
    }

    pub fn with_min_spine_options(mut self, min_spine_options: usize) -> Self {
        self.min_spine_options = min_spine_options;
        self
    }

    pub fn with_goal(mut self, goal: TuningGoal) -> Self {
        self.tuning_goals.insert(goal);
        self
    }

    pub fn with_preferred_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.preferred_manufacturers.push(manufacturer.into());
        self
    }

    pub fn with_diameter_range(mut self, low: f64, high: f64) -> Self {
        self.target_diameter_range = Some((low, high));
        self
    }

    pub fn with_foc_range(mut self, low: f64, high: f64) -> Self {
        self.target_foc_range = Some((low, high));
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Validate the request together with its nested profile and bow
    pub fn validate_all(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        self.archer_profile.validate()?;
        self.archer_profile.bow_config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{BowConfiguration, BowType};

    fn profile() -> ArcherProfile {
        ArcherProfile::new("Test Archer", BowConfiguration::new(50.0, 28.0, BowType::Compound))
    }

    #[test]
    fn test_defaults() {
        let request = MatchRequest::new(profile(), 28.0);
        assert_eq!(request.point_weight, 125.0);
        assert_eq!(request.min_spine_options, 3);
        assert_eq!(request.max_results, 20);
        assert!(request.validate_all().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_arrow_length() {
        let request = MatchRequest::new(profile(), 0.0);
        let errors = request.validate_all().unwrap_err();
        assert!(errors.to_string().contains("arrow_length"));
    }

    #[test]
    fn test_rejects_bad_bow_config() {
        let mut archer = profile();
        archer.bow_config.draw_weight = -5.0;
        let request = MatchRequest::new(archer, 28.0);
        let errors = request.validate_all().unwrap_err();
        assert!(errors.to_string().contains("draw_weight"));
    }

    #[test]
    fn test_rejects_inverted_diameter_range() {
        let mut request = MatchRequest::new(profile(), 28.0);
        request.target_diameter_range = Some((0.30, 0.20));
        assert!(request.validate_all().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "archer_profile": {
                "name": "Robin",
                "bow_config": { "draw_weight": 45, "draw_length": 28, "bow_type": "recurve" },
                "shooting_style": "barebow"
            },
            "arrow_length": 29,
            "tuning_goals": ["maximum_accuracy"],
            "material_preference": "carbon"
        }"#;

        let request: MatchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.archer_profile.bow_config.bow_type, BowType::Recurve);
        assert_eq!(request.nock_weight, 10.0);
        assert!(request.tuning_goals.contains(&TuningGoal::MaximumAccuracy));
        assert_eq!(request.material_preference.as_deref(), Some("carbon"));
    }
}
