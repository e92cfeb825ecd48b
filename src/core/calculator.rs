use std::sync::Arc;

use crate::core::filters::normalize_material;
use crate::core::formula::SpineError;
use crate::models::{
    ArcherProfile, BowType, CalculationSource, ConfidenceLevel, MatchRequest, SpineAdjustments,
    SpineCalculationResult, SpineRange,
};
use crate::services::parameters::{CalculationConfigProvider, Resolved};

/// Smallest half-width the spine window may have, in spine units
const MIN_WINDOW_HALF_WIDTH: f64 = 1.0;

/// Computes required spine from a bow setup
///
/// Configuration problems never surface as errors here: the provider
/// answers with built-in defaults and the result is tagged
/// `default_fallback` with lowered confidence.
#[derive(Clone)]
pub struct SpineCalculationService {
    provider: Arc<CalculationConfigProvider>,
}

/// Everything one calculation reads
struct CalculationInput<'a> {
    draw_weight: f64,
    arrow_length: f64,
    point_weight: f64,
    bow_type: BowType,
    shooting_style: Option<&'a str>,
    material: Option<&'a str>,
    arrow_rest_type: Option<&'a str>,
}

impl SpineCalculationService {
    pub fn new(provider: Arc<CalculationConfigProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<CalculationConfigProvider> {
        &self.provider
    }

    /// Required spine for a draw weight (lbs), arrow length (in) and point
    /// weight (gr) on the given bow type
    pub fn calculate(
        &self,
        draw_weight: f64,
        arrow_length: f64,
        point_weight: f64,
        bow_type: BowType,
        shooting_style: Option<&str>,
        material: Option<&str>,
    ) -> Result<SpineCalculationResult, SpineError> {
        self.run(CalculationInput {
            draw_weight,
            arrow_length,
            point_weight,
            bow_type,
            shooting_style,
            material,
            arrow_rest_type: None,
        })
    }

    /// Calculate from an archer profile; the profile's arrow length and
    /// point weight preference win over the arguments when set
    pub fn calculate_for_profile(
        &self,
        profile: &ArcherProfile,
        arrow_length: f64,
        point_weight: f64,
        material: Option<&str>,
    ) -> Result<SpineCalculationResult, SpineError> {
        self.run(CalculationInput {
            draw_weight: profile.bow_config.draw_weight,
            arrow_length: profile.arrow_length.unwrap_or(arrow_length),
            point_weight: profile.point_weight_preference.unwrap_or(point_weight),
            bow_type: profile.bow_config.bow_type,
            shooting_style: profile.shooting_style.as_deref(),
            material,
            arrow_rest_type: profile.bow_config.arrow_rest_type.as_deref(),
        })
    }

    /// Calculate for a match request, using its own arrow build
    pub fn calculate_for_request(
        &self,
        request: &MatchRequest,
    ) -> Result<SpineCalculationResult, SpineError> {
        let profile = &request.archer_profile;
        self.run(CalculationInput {
            draw_weight: profile.bow_config.draw_weight,
            arrow_length: request.arrow_length,
            point_weight: request.point_weight,
            bow_type: profile.bow_config.bow_type,
            shooting_style: profile.shooting_style.as_deref(),
            material: request.material_preference.as_deref(),
            arrow_rest_type: profile.bow_config.arrow_rest_type.as_deref(),
        })
    }

    fn run(&self, input: CalculationInput<'_>) -> Result<SpineCalculationResult, SpineError> {
        let formula = self.provider.formula();
        let baseline = formula
            .value
            .compute_baseline(input.draw_weight, input.arrow_length, input.point_weight)?;

        let bow_type_adjustment = self.provider.bow_type_adjustment(input.bow_type);
        let shooting_style_adjustment = input
            .shooting_style
            .map(|style| self.provider.shooting_style_adjustment(input.bow_type, style))
            .unwrap_or_else(|| Resolved::configured(0.0));
        let material_info = input
            .material
            .map(|material| self.provider.material_properties(material))
            .unwrap_or_else(|| Resolved::configured(None));
        let material_adjustment = input
            .material
            .map(|material| self.provider.material_adjustment(material))
            .unwrap_or_else(|| Resolved::configured(0.0));
        let tolerance = self.provider.spine_tolerance();

        let adjustments = SpineAdjustments {
            length_adjustment: baseline.length_adjustment,
            point_weight_adjustment: baseline.point_weight_adjustment,
            bow_type_adjustment: bow_type_adjustment.value,
            shooting_style_adjustment: shooting_style_adjustment.value,
            material_adjustment: material_adjustment.value,
        };

        let calculated_spine = baseline.base + adjustments.total();
        if !(calculated_spine.is_finite() && calculated_spine > 0.0) {
            return Err(SpineError::NonPositiveSpine(calculated_spine));
        }

        let half_width = (calculated_spine * tolerance.value).max(MIN_WINDOW_HALF_WIDTH);
        let spine_range = SpineRange {
            minimum: calculated_spine - half_width,
            maximum: calculated_spine + half_width,
        };

        let fallback_parameters: Vec<String> = [
            ("formula", formula.source),
            ("spine_tolerance", tolerance.source),
            ("bow_type_adjustment", bow_type_adjustment.source),
            ("shooting_style_adjustment", shooting_style_adjustment.source),
            ("material_properties", material_info.source),
            ("material_adjustment", material_adjustment.source),
        ]
        .into_iter()
        .filter(|(_, source)| *source == CalculationSource::DefaultFallback)
        .map(|(name, _)| name.to_string())
        .collect();

        let source = if fallback_parameters.is_empty() {
            CalculationSource::Configured
        } else {
            CalculationSource::DefaultFallback
        };

        let confidence = calculation_confidence(input.bow_type, input.material, source);
        let notes = spine_notes(
            calculated_spine,
            input.bow_type,
            input.arrow_rest_type,
            source,
        );

        if source == CalculationSource::DefaultFallback {
            tracing::warn!(
                "Spine calculated with built-in defaults for: {}",
                fallback_parameters.join(", ")
            );
        }
        tracing::debug!(
            "Calculated spine {:.1} ({:.1}-{:.1}) for {} lbs {} at {}\"",
            calculated_spine,
            spine_range.minimum,
            spine_range.maximum,
            input.draw_weight,
            input.bow_type,
            input.arrow_length
        );

        Ok(SpineCalculationResult {
            calculated_spine,
            base_spine: baseline.base,
            spine_range,
            confidence,
            confidence_level: ConfidenceLevel::from_score(confidence),
            adjustments,
            source,
            bow_type: input.bow_type,
            fallback_parameters,
            material_info: material_info.value,
            notes,
        })
    }
}

/// Start high, lose confidence for less predictable setups and for any
/// parameter served from defaults
fn calculation_confidence(
    bow_type: BowType,
    material: Option<&str>,
    source: CalculationSource,
) -> f64 {
    let mut confidence: f64 = 0.9;

    if bow_type != BowType::Compound {
        confidence -= 0.1;
    }
    if material.is_some_and(|material| normalize_material(material).contains("wood")) {
        confidence -= 0.1;
    }
    if source == CalculationSource::DefaultFallback {
        confidence -= 0.25;
    }

    (confidence.clamp(0.1, 1.0) * 100.0).round() / 100.0
}

fn spine_notes(
    calculated_spine: f64,
    bow_type: BowType,
    arrow_rest_type: Option<&str>,
    source: CalculationSource,
) -> Vec<String> {
    let mut notes = Vec::new();

    if calculated_spine < 250.0 {
        notes.push("Very stiff arrow required - consider high draw weight setup".to_string());
    } else if calculated_spine > 600.0 {
        notes.push("Weak spine required - double-check calculations".to_string());
    }

    if bow_type == BowType::Compound {
        notes.push("Fine-tune with paper tuning or bare shaft testing".to_string());

        if arrow_rest_type.is_some_and(|rest| rest.eq_ignore_ascii_case("whisker_biscuit")) {
            notes.push("Whisker biscuit may require slightly stiffer arrow".to_string());
        }
    }

    if source == CalculationSource::DefaultFallback {
        notes.push(
            "Some calculation parameters were unavailable; built-in defaults were used".to_string(),
        );
    }

    notes
}
