use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::core::SpineError;
use crate::services::catalog::{CatalogError, ProductId, ProductSummary};

/// Bow families the spine formula knows how to adjust for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BowType {
    Compound,
    Recurve,
    Traditional,
    Barebow,
    Longbow,
}

impl BowType {
    pub const ALL: [BowType; 5] = [
        BowType::Compound,
        BowType::Recurve,
        BowType::Traditional,
        BowType::Barebow,
        BowType::Longbow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BowType::Compound => "compound",
            BowType::Recurve => "recurve",
            BowType::Traditional => "traditional",
            BowType::Barebow => "barebow",
            BowType::Longbow => "longbow",
        }
    }
}

impl fmt::Display for BowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BowType {
    type Err = SpineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        BowType::ALL
            .into_iter()
            .find(|bow_type| bow_type.as_str() == normalized)
            .ok_or_else(|| SpineError::InvalidParameter {
                field: "bow_type",
                reason: format!("unrecognized bow type '{}'", s),
            })
    }
}

/// Physical bow setup. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BowConfiguration {
    #[validate(range(exclusive_min = 0.0, max = 200.0))]
    pub draw_weight: f64,
    #[validate(range(exclusive_min = 0.0, max = 40.0))]
    pub draw_length: f64,
    pub bow_type: BowType,
    #[serde(default)]
    pub cam_type: Option<String>,
    #[serde(default)]
    pub arrow_rest_type: Option<String>,
    #[serde(default)]
    pub ibo_speed: Option<f64>,
}

impl BowConfiguration {
    pub fn new(draw_weight: f64, draw_length: f64, bow_type: BowType) -> Self {
        Self {
            draw_weight,
            draw_length,
            bow_type,
            cam_type: None,
            arrow_rest_type: None,
            ibo_speed: None,
        }
    }

    pub fn with_arrow_rest(mut self, arrow_rest_type: impl Into<String>) -> Self {
        self.arrow_rest_type = Some(arrow_rest_type.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

/// Archer and bow, built per request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ArcherProfile {
    #[validate(length(min = 1))]
    pub name: String,
    pub bow_config: BowConfiguration,
    #[serde(default)]
    pub shooting_style: Option<String>,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub arrow_length: Option<f64>,
    #[serde(default)]
    pub point_weight_preference: Option<f64>,
}

impl ArcherProfile {
    pub fn new(name: impl Into<String>, bow_config: BowConfiguration) -> Self {
        Self {
            name: name.into(),
            bow_config,
            shooting_style: None,
            experience_level: ExperienceLevel::default(),
            arrow_length: None,
            point_weight_preference: None,
        }
    }

    pub fn with_shooting_style(mut self, style: impl Into<String>) -> Self {
        self.shooting_style = Some(style.into());
        self
    }
}

/// One spine-specific variant of an arrow product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineSpecification {
    pub spine: u32,
    pub outer_diameter: f64,
    #[serde(default)]
    pub inner_diameter: Option<f64>,
    pub gpi_weight: f64,
    #[serde(default)]
    pub length_options: Vec<f64>,
}

impl SpineSpecification {
    pub fn new(spine: u32, outer_diameter: f64, gpi_weight: f64) -> Self {
        Self {
            spine,
            outer_diameter,
            inner_diameter: None,
            gpi_weight,
            length_options: Vec::new(),
        }
    }

    pub fn with_length_options(mut self, lengths: Vec<f64>) -> Self {
        self.length_options = lengths;
        self
    }

    /// Whether a shaft long enough for `arrow_length` is sold.
    /// Shafts with no declared lengths are assumed cut-to-length.
    pub fn supports_length(&self, arrow_length: f64) -> bool {
        self.length_options.is_empty()
            || self.length_options.iter().any(|length| *length >= arrow_length)
    }
}

/// Catalog product. Spine values are unique within a product, enforced on
/// construction and on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawArrowProduct")]
pub struct ArrowProduct {
    pub id: ProductId,
    pub manufacturer: String,
    pub model_name: String,
    pub material: String,
    pub arrow_type: Option<String>,
    pub description: Option<String>,
    spine_specifications: Vec<SpineSpecification>,
}

#[derive(Deserialize)]
struct RawArrowProduct {
    id: ProductId,
    manufacturer: String,
    model_name: String,
    material: String,
    #[serde(default)]
    arrow_type: Option<String>,
    #[serde(default)]
    description: Option<String>,
    spine_specifications: Vec<SpineSpecification>,
}

impl TryFrom<RawArrowProduct> for ArrowProduct {
    type Error = CatalogError;

    fn try_from(raw: RawArrowProduct) -> Result<Self, Self::Error> {
        let mut product = ArrowProduct::new(
            raw.id,
            raw.manufacturer,
            raw.model_name,
            raw.material,
            raw.spine_specifications,
        )?;
        product.arrow_type = raw.arrow_type;
        product.description = raw.description;
        Ok(product)
    }
}

impl ArrowProduct {
    pub fn new(
        id: ProductId,
        manufacturer: impl Into<String>,
        model_name: impl Into<String>,
        material: impl Into<String>,
        mut spine_specifications: Vec<SpineSpecification>,
    ) -> Result<Self, CatalogError> {
        let manufacturer = manufacturer.into();
        let model_name = model_name.into();

        spine_specifications.sort_by_key(|spec| spec.spine);
        validate_specifications(&manufacturer, &model_name, &spine_specifications)?;

        Ok(Self {
            id,
            manufacturer,
            model_name,
            material: material.into(),
            arrow_type: None,
            description: None,
            spine_specifications,
        })
    }

    /// Rebuild a full product from a catalog search hit and its variants
    pub fn from_summary(
        summary: ProductSummary,
        variants: Vec<SpineSpecification>,
    ) -> Result<Self, CatalogError> {
        let mut product = ArrowProduct::new(
            summary.id,
            summary.manufacturer,
            summary.model_name,
            summary.material,
            variants,
        )?;
        product.arrow_type = summary.arrow_type;
        product.description = summary.description;
        Ok(product)
    }

    /// Specifications ordered by ascending spine
    pub fn spine_specifications(&self) -> &[SpineSpecification] {
        &self.spine_specifications
    }

    pub fn spine_option_count(&self) -> usize {
        self.spine_specifications.len()
    }

    /// Stiffest and weakest spine offered
    pub fn spine_coverage(&self) -> Option<(u32, u32)> {
        let first = self.spine_specifications.first()?;
        let last = self.spine_specifications.last()?;
        Some((first.spine, last.spine))
    }

    pub fn summary(&self) -> ProductSummary {
        let (min_spine, max_spine) = self.spine_coverage().unwrap_or((0, 0));
        ProductSummary {
            id: self.id,
            manufacturer: self.manufacturer.clone(),
            model_name: self.model_name.clone(),
            material: self.material.clone(),
            arrow_type: self.arrow_type.clone(),
            description: self.description.clone(),
            min_spine,
            max_spine,
            spine_count: self.spine_specifications.len(),
        }
    }
}

/// Expects `specs` sorted by spine
fn validate_specifications(
    manufacturer: &str,
    model_name: &str,
    specs: &[SpineSpecification],
) -> Result<(), CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidSpecification {
        manufacturer: manufacturer.to_string(),
        model_name: model_name.to_string(),
        reason,
    };

    for spec in specs {
        if spec.spine == 0 {
            return Err(invalid("spine must be positive".to_string()));
        }
        if !(spec.gpi_weight.is_finite() && spec.gpi_weight > 0.0) {
            return Err(invalid(format!("spine {} has non-positive gpi_weight", spec.spine)));
        }
        if !(spec.outer_diameter.is_finite() && spec.outer_diameter >= 0.0) {
            return Err(invalid(format!("spine {} has invalid outer_diameter", spec.spine)));
        }
    }

    if let Some(pair) = specs.windows(2).find(|pair| pair[0].spine == pair[1].spine) {
        return Err(CatalogError::DuplicateSpine {
            manufacturer: manufacturer.to_string(),
            model_name: model_name.to_string(),
            spine: pair[0].spine,
        });
    }

    Ok(())
}

/// Material data sheet as held by the configuration store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    pub name: String,
    #[serde(default)]
    pub density: Option<f64>,
    #[serde(default)]
    pub elasticity_modulus: Option<f64>,
    #[serde(default)]
    pub strength_factor: Option<f64>,
    /// Multiplier relative to carbon (1.0); scaled into spine units
    pub spine_adjustment_factor: f64,
    /// Minimum spine variants a product needs to count as tunable
    pub min_spine_options: usize,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub typical_use: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationSource {
    Configured,
    DefaultFallback,
}

impl CalculationSource {
    /// Fallback is sticky: once any input fell back, the whole result did
    pub fn combine(self, other: CalculationSource) -> CalculationSource {
        if self == CalculationSource::DefaultFallback || other == CalculationSource::DefaultFallback {
            CalculationSource::DefaultFallback
        } else {
            CalculationSource::Configured
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= 0.8 {
            ConfidenceLevel::High
        } else if confidence >= 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Acceptable spine window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpineRange {
    pub minimum: f64,
    pub maximum: f64,
}

impl SpineRange {
    pub fn width(&self) -> f64 {
        self.maximum - self.minimum
    }

    pub fn half_width(&self) -> f64 {
        self.width() / 2.0
    }

    pub fn contains(&self, spine: f64) -> bool {
        spine >= self.minimum && spine <= self.maximum
    }
}

/// Named breakdown of every term added on top of the base spine
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpineAdjustments {
    pub length_adjustment: f64,
    pub point_weight_adjustment: f64,
    pub bow_type_adjustment: f64,
    pub shooting_style_adjustment: f64,
    pub material_adjustment: f64,
}

impl SpineAdjustments {
    pub fn total(&self) -> f64 {
        self.length_adjustment
            + self.point_weight_adjustment
            + self.bow_type_adjustment
            + self.shooting_style_adjustment
            + self.material_adjustment
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineCalculationResult {
    pub calculated_spine: f64,
    pub base_spine: f64,
    pub spine_range: SpineRange,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub adjustments: SpineAdjustments,
    pub source: CalculationSource,
    pub bow_type: BowType,
    /// Parameters that were served from built-in defaults
    #[serde(default)]
    pub fallback_parameters: Vec<String>,
    #[serde(default)]
    pub material_info: Option<MaterialProperties>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Named optimization objective that reweights scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningGoal {
    MaximumAccuracy,
    MaximumSpeed,
    OptimalPenetration,
    HuntingEffectiveness,
    BalancedPerformance,
}

/// Which end of the GPI scale the goals favour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassPreference {
    Light,
    Neutral,
    Heavy,
}

impl MassPreference {
    pub fn from_goals(goals: &BTreeSet<TuningGoal>) -> Self {
        let wants_speed = goals.contains(&TuningGoal::MaximumSpeed);
        let wants_mass = goals.contains(&TuningGoal::OptimalPenetration)
            || goals.contains(&TuningGoal::HuntingEffectiveness);

        match (wants_speed, wants_mass) {
            (true, false) => MassPreference::Light,
            (false, true) => MassPreference::Heavy,
            _ => MassPreference::Neutral,
        }
    }
}

/// Scoring weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub spine_accuracy: f64,
    pub availability: f64,
    pub manufacturer: f64,
    pub diameter: f64,
    pub foc: f64,
    pub mass: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            spine_accuracy: 0.40,
            availability: 0.20,
            manufacturer: 0.10,
            diameter: 0.15,
            foc: 0.15,
            mass: 0.0,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.spine_accuracy + self.availability + self.manufacturer + self.diameter + self.foc + self.mass
    }

    /// Shift weight towards what the requested goals care about
    pub fn for_goals(&self, goals: &BTreeSet<TuningGoal>) -> Self {
        let mut weights = *self;
        for goal in goals {
            match goal {
                TuningGoal::MaximumAccuracy => {
                    weights.spine_accuracy += 0.20;
                    weights.diameter += 0.05;
                }
                TuningGoal::MaximumSpeed => {
                    weights.mass += 0.15;
                }
                TuningGoal::OptimalPenetration => {
                    weights.mass += 0.15;
                    weights.diameter += 0.05;
                }
                TuningGoal::HuntingEffectiveness => {
                    weights.mass += 0.10;
                    weights.foc += 0.10;
                }
                TuningGoal::BalancedPerformance => {}
            }
        }
        weights
    }
}

/// Ranked candidate: a product matched through one of its specifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowMatch {
    pub product: ArrowProduct,
    pub specification: SpineSpecification,
    pub matched_spine: u32,
    /// Signed: positive when the matched shaft is weaker than calculated
    pub spine_deviation: f64,
    pub match_score: f64,
    pub outer_diameter: f64,
    pub gpi_weight: f64,
    pub confidence_level: ConfidenceLevel,
    pub match_reasons: Vec<String>,
    pub potential_issues: Vec<String>,
}

impl ArrowMatch {
    pub fn manufacturer(&self) -> &str {
        &self.product.manufacturer
    }

    pub fn model_name(&self) -> &str {
        &self.product.model_name
    }
}
