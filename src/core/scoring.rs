use std::cmp::Ordering;

use crate::core::foc::calculate_foc;
use crate::models::{
    ArrowMatch, ArrowProduct, MassPreference, MatchRequest, ScoringWeights, SpineRange,
    SpineSpecification,
};

/// Spine options at which availability scores full marks
const FULL_AVAILABILITY_OPTIONS: f64 = 8.0;

/// Per-component scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub spine_accuracy: f64,
    pub availability: f64,
    pub manufacturer: f64,
    pub diameter: f64,
    pub foc: f64,
    pub mass: f64,
}

impl ScoreBreakdown {
    /// Weighted mean scaled to 0-100, rounded to one decimal
    pub fn weighted(&self, weights: &ScoringWeights) -> f64 {
        let total_weight = weights.total();
        if total_weight <= 0.0 {
            return 0.0;
        }

        let sum = self.spine_accuracy * weights.spine_accuracy
            + self.availability * weights.availability
            + self.manufacturer * weights.manufacturer
            + self.diameter * weights.diameter
            + self.foc * weights.foc
            + self.mass * weights.mass;

        let score = (sum / total_weight * 100.0).clamp(0.0, 100.0);
        (score * 10.0).round() / 10.0
    }
}

/// Calculate a match score (0-100) for one product variant
///
/// Scoring formula, with `weights` already adjusted for the request's
/// tuning goals:
/// score = (
///     spine_accuracy * w.spine_accuracy +  # 1 - |deviation| / window width
///     availability   * w.availability +    # spine options / 8
///     manufacturer   * w.manufacturer +    # 0.5 when not a preferred brand
///     diameter       * w.diameter +        # target range or bow reference
///     foc            * w.foc +             # target FOC range, if any
///     mass           * w.mass              # GPI vs. speed/penetration goals
/// ) / sum(weights) * 100
pub fn calculate_match_score(
    product: &ArrowProduct,
    specification: &SpineSpecification,
    request: &MatchRequest,
    calculated_spine: f64,
    spine_range: &SpineRange,
    reference_diameter: f64,
    weights: &ScoringWeights,
) -> (f64, ScoreBreakdown) {
    let deviation = (f64::from(specification.spine) - calculated_spine).abs();

    let breakdown = ScoreBreakdown {
        spine_accuracy: spine_accuracy_score(deviation, spine_range),
        availability: availability_score(product.spine_option_count()),
        manufacturer: manufacturer_score(&product.manufacturer, &request.preferred_manufacturers),
        diameter: diameter_score(
            specification.outer_diameter,
            request.target_diameter_range,
            reference_diameter,
        ),
        foc: foc_score(specification, request),
        mass: mass_score(
            specification.gpi_weight,
            MassPreference::from_goals(&request.tuning_goals),
        ),
    };

    (breakdown.weighted(weights), breakdown)
}

/// Higher deviation relative to the window scores lower
#[inline]
pub fn spine_accuracy_score(deviation: f64, spine_range: &SpineRange) -> f64 {
    let width = spine_range.width();
    if width <= 0.0 {
        return if deviation == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - (deviation.abs() / width).min(1.0)
}

#[inline]
fn availability_score(spine_options: usize) -> f64 {
    (spine_options as f64 / FULL_AVAILABILITY_OPTIONS).min(1.0)
}

#[inline]
fn manufacturer_score(manufacturer: &str, preferred: &[String]) -> f64 {
    if preferred.is_empty() {
        return 1.0;
    }

    let manufacturer = manufacturer.to_lowercase();
    if preferred
        .iter()
        .any(|preference| manufacturer.contains(&preference.to_lowercase()))
    {
        1.0
    } else {
        0.5
    }
}

/// Inside a requested range scores 1, losing everything 0.05" outside it.
/// Without a range, closeness to the bow type's usual shaft is rewarded.
#[inline]
fn diameter_score(diameter: f64, target: Option<(f64, f64)>, reference_diameter: f64) -> f64 {
    if diameter <= 0.0 {
        return 0.5;
    }

    match target {
        Some((low, high)) => {
            let gap = distance_outside(diameter, low, high);
            1.0 - (gap / 0.05).min(1.0)
        }
        None => 1.0 - ((diameter - reference_diameter).abs() / 0.1).min(1.0),
    }
}

/// Inside the requested FOC range scores 1, losing everything 2% outside it
fn foc_score(specification: &SpineSpecification, request: &MatchRequest) -> f64 {
    let Some((low, high)) = request.target_foc_range else {
        return 1.0;
    };

    let shaft_weight = specification.gpi_weight * request.arrow_length;
    match calculate_foc(
        request.arrow_length,
        request.point_weight,
        shaft_weight,
        request.nock_weight,
        request.fletching_weight,
        request.insert_weight,
    ) {
        Ok(foc) => 1.0 - (distance_outside(foc.foc_percentage, low, high) / 2.0).min(1.0),
        Err(_) => 0.0,
    }
}

#[inline]
fn mass_score(gpi_weight: f64, preference: MassPreference) -> f64 {
    let heaviness = ((gpi_weight - 5.0) / 10.0).clamp(0.0, 1.0);
    match preference {
        MassPreference::Light => 1.0 - heaviness,
        MassPreference::Heavy => heaviness,
        MassPreference::Neutral => 1.0 - ((gpi_weight - 8.5).abs() / 8.5).min(1.0),
    }
}

#[inline]
fn distance_outside(value: f64, low: f64, high: f64) -> f64 {
    if value < low {
        low - value
    } else if value > high {
        value - high
    } else {
        0.0
    }
}

/// Total order for ranked matches
///
/// Score descending, then smaller |deviation|, then diameter nearer the
/// reference, then manufacturer and model name ascending (case-insensitive
/// first, exact second) and finally product id.
pub fn compare_matches(a: &ArrowMatch, b: &ArrowMatch, reference_diameter: f64) -> Ordering {
    let diameter_gap = |m: &ArrowMatch| (m.outer_diameter - reference_diameter).abs();

    b.match_score
        .partial_cmp(&a.match_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            a.spine_deviation
                .abs()
                .partial_cmp(&b.spine_deviation.abs())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| {
            diameter_gap(a)
                .partial_cmp(&diameter_gap(b))
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| {
            a.manufacturer()
                .to_lowercase()
                .cmp(&b.manufacturer().to_lowercase())
        })
        .then_with(|| a.manufacturer().cmp(b.manufacturer()))
        .then_with(|| a.model_name().to_lowercase().cmp(&b.model_name().to_lowercase()))
        .then_with(|| a.model_name().cmp(b.model_name()))
        .then_with(|| a.product.id.cmp(&b.product.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ArcherProfile, BowConfiguration, BowType, ConfidenceLevel, TuningGoal,
    };

    fn create_request() -> MatchRequest {
        let bow = BowConfiguration::new(50.0, 28.0, BowType::Compound);
        MatchRequest::new(ArcherProfile::new("Test Archer", bow), 28.0)
    }

    fn create_product(manufacturer: &str, spines: &[u32]) -> ArrowProduct {
        let specs = spines
            .iter()
            .map(|spine| SpineSpecification::new(*spine, 0.246, 8.0))
            .collect();
        ArrowProduct::new(1, manufacturer, "Test Shaft", "Carbon", specs).unwrap()
    }

    fn window() -> SpineRange {
        SpineRange {
            minimum: 600.0,
            maximum: 650.0,
        }
    }

    fn create_match(manufacturer: &str, model: &str, score: f64, deviation: f64) -> ArrowMatch {
        let product = ArrowProduct::new(
            1,
            manufacturer,
            model,
            "Carbon",
            vec![SpineSpecification::new(600, 0.246, 8.0)],
        )
        .unwrap();
        let specification = product.spine_specifications()[0].clone();
        ArrowMatch {
            product,
            specification,
            matched_spine: 600,
            spine_deviation: deviation,
            match_score: score,
            outer_diameter: 0.246,
            gpi_weight: 8.0,
            confidence_level: ConfidenceLevel::High,
            match_reasons: Vec::new(),
            potential_issues: Vec::new(),
        }
    }

    #[test]
    fn test_spine_accuracy_monotone() {
        let range = window();
        let exact = spine_accuracy_score(0.0, &range);
        let close = spine_accuracy_score(10.0, &range);
        let far = spine_accuracy_score(40.0, &range);
        let outside = spine_accuracy_score(200.0, &range);

        assert_eq!(exact, 1.0);
        assert!(exact > close && close > far);
        assert_eq!(outside, 0.0);
    }

    #[test]
    fn test_score_within_bounds() {
        let request = create_request();
        let product = create_product("Easton", &[300, 400, 500, 600, 700, 800, 900, 1000]);
        let spec = &product.spine_specifications()[3];

        let (score, breakdown) = calculate_match_score(
            &product,
            spec,
            &request,
            625.0,
            &window(),
            0.246,
            &ScoringWeights::default(),
        );

        assert!((0.0..=100.0).contains(&score));
        assert_eq!(breakdown.availability, 1.0);
        assert_eq!(breakdown.manufacturer, 1.0);
        assert_eq!(breakdown.diameter, 1.0);
        assert_eq!(breakdown.spine_accuracy, 0.5);
    }

    #[test]
    fn test_closer_spine_scores_higher() {
        let request = create_request();
        let product = create_product("Easton", &[500, 600, 700]);
        let weights = ScoringWeights::default();

        let (close, _) = calculate_match_score(
            &product,
            &product.spine_specifications()[1],
            &request,
            610.0,
            &window(),
            0.246,
            &weights,
        );
        let (far, _) = calculate_match_score(
            &product,
            &product.spine_specifications()[1],
            &request,
            640.0,
            &window(),
            0.246,
            &weights,
        );

        assert!(close > far);
    }

    #[test]
    fn test_non_preferred_manufacturer_penalty() {
        let mut request = create_request();
        request.preferred_manufacturers = vec!["gold tip".to_string()];

        assert_eq!(manufacturer_score("Gold Tip", &request.preferred_manufacturers), 1.0);
        assert_eq!(manufacturer_score("Easton", &request.preferred_manufacturers), 0.5);
    }

    #[test]
    fn test_diameter_range_penalty() {
        assert_eq!(diameter_score(0.246, Some((0.240, 0.250)), 0.246), 1.0);
        let near = diameter_score(0.260, Some((0.240, 0.250)), 0.246);
        assert!((near - 0.8).abs() < 1e-9);
        assert_eq!(diameter_score(0.400, Some((0.240, 0.250)), 0.246), 0.0);
    }

    #[test]
    fn test_mass_preference() {
        assert!(mass_score(6.0, MassPreference::Light) > mass_score(12.0, MassPreference::Light));
        assert!(mass_score(12.0, MassPreference::Heavy) > mass_score(6.0, MassPreference::Heavy));
        assert_eq!(mass_score(8.5, MassPreference::Neutral), 1.0);
    }

    #[test]
    fn test_foc_range_scoring() {
        let mut request = create_request();
        let spec = SpineSpecification::new(400, 0.246, 8.0);

        assert_eq!(foc_score(&spec, &request), 1.0);

        // Estimated FOC for this build is 14.78%
        request.target_foc_range = Some((10.0, 15.0));
        assert_eq!(foc_score(&spec, &request), 1.0);

        request.target_foc_range = Some((18.0, 20.0));
        assert_eq!(foc_score(&spec, &request), 0.0);
    }

    #[test]
    fn test_speed_goal_prefers_light_shafts() {
        let request = create_request().with_goal(TuningGoal::MaximumSpeed);
        let weights = ScoringWeights::default().for_goals(&request.tuning_goals);

        let light = ArrowProduct::new(
            1,
            "Easton",
            "Light",
            "Carbon",
            vec![SpineSpecification::new(600, 0.246, 6.0)],
        )
        .unwrap();
        let heavy = ArrowProduct::new(
            2,
            "Easton",
            "Heavy",
            "Carbon",
            vec![SpineSpecification::new(600, 0.246, 12.0)],
        )
        .unwrap();

        let (light_score, _) = calculate_match_score(
            &light,
            &light.spine_specifications()[0],
            &request,
            625.0,
            &window(),
            0.246,
            &weights,
        );
        let (heavy_score, _) = calculate_match_score(
            &heavy,
            &heavy.spine_specifications()[0],
            &request,
            625.0,
            &window(),
            0.246,
            &weights,
        );

        assert!(light_score > heavy_score);
    }

    #[test]
    fn test_compare_matches_orders_by_score_then_manufacturer() {
        let mut matches = vec![
            create_match("Gold Tip", "Hunter", 80.0, 10.0),
            create_match("Easton", "Axis", 80.0, 10.0),
            create_match("Victory", "VAP", 90.0, 10.0),
            create_match("easton", "Axis", 80.0, 10.0),
        ];

        matches.sort_by(|a, b| compare_matches(a, b, 0.246));

        let order: Vec<&str> = matches.iter().map(|m| m.manufacturer()).collect();
        assert_eq!(order, vec!["Victory", "Easton", "easton", "Gold Tip"]);
    }

    #[test]
    fn test_compare_matches_deviation_before_name() {
        let mut matches = vec![
            create_match("Aaa", "Model", 80.0, -20.0),
            create_match("Zzz", "Model", 80.0, 5.0),
        ];

        matches.sort_by(|a, b| compare_matches(a, b, 0.246));

        assert_eq!(matches[0].manufacturer(), "Zzz");
    }
}
