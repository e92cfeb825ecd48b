use crate::models::{
    ArrowProduct, BowType, ConfidenceLevel, MatchRequest, SpineRange, SpineSpecification,
};

/// Confidence in one match from how much of the half-window the deviation uses
pub fn match_confidence(deviation: f64, spine_range: &SpineRange) -> ConfidenceLevel {
    let half_width = spine_range.half_width();
    if half_width <= 0.0 {
        return if deviation == 0.0 {
            ConfidenceLevel::High
        } else {
            ConfidenceLevel::Low
        };
    }

    let ratio = deviation.abs() / half_width;
    if ratio <= 0.3 {
        ConfidenceLevel::High
    } else if ratio <= 0.7 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

/// Why a match is worth considering
pub fn match_reasons(
    product: &ArrowProduct,
    specification: &SpineSpecification,
    deviation: f64,
    request: &MatchRequest,
) -> Vec<String> {
    let mut reasons = Vec::new();

    let deviation = deviation.abs();
    if deviation <= 10.0 {
        reasons.push("Excellent spine match".to_string());
    } else if deviation <= 25.0 {
        reasons.push("Good spine match".to_string());
    } else {
        reasons.push("Acceptable spine match".to_string());
    }

    let spine_count = product.spine_option_count();
    if spine_count >= 6 {
        reasons.push(format!("Excellent availability ({} spine options)", spine_count));
    } else if spine_count >= 3 {
        reasons.push(format!("Good availability ({} spine options)", spine_count));
    }

    let manufacturer = product.manufacturer.to_lowercase();
    if request
        .preferred_manufacturers
        .iter()
        .any(|preference| manufacturer.contains(&preference.to_lowercase()))
    {
        reasons.push(format!("Preferred manufacturer ({})", product.manufacturer));
    }

    let diameter = specification.outer_diameter;
    if diameter > 0.0 && diameter <= 0.24 {
        reasons.push("Small diameter for excellent penetration".to_string());
    } else if diameter >= 0.30 {
        reasons.push("Large diameter for maximum cutting surface".to_string());
    }

    reasons
}

/// What might go wrong with a match
pub fn potential_issues(
    product: &ArrowProduct,
    specification: &SpineSpecification,
    deviation: f64,
    request: &MatchRequest,
) -> Vec<String> {
    let mut issues = Vec::new();

    let deviation = deviation.abs();
    if deviation > 40.0 {
        issues.push("Large spine deviation - may require tuning".to_string());
    } else if deviation > 25.0 {
        issues.push("Moderate spine deviation - paper tuning recommended".to_string());
    }

    let gpi = specification.gpi_weight;
    if gpi > 12.0 && request.archer_profile.bow_config.bow_type == BowType::Compound {
        issues.push("Heavy arrow - may reduce arrow speed significantly".to_string());
    } else if gpi < 5.0 {
        issues.push("Very light arrow - may cause noise and vibration".to_string());
    }

    let diameter = specification.outer_diameter;
    if diameter > 0.0 && diameter < 0.20 {
        issues.push("Very small diameter - may be fragile".to_string());
    } else if diameter > 0.35 {
        issues.push("Large diameter - may cause wind drift".to_string());
    }

    if product.spine_option_count() < 3 {
        issues.push("Limited spine options available".to_string());
    }

    if !specification.supports_length(request.arrow_length) {
        issues.push(format!(
            "No stocked length reaches {:.1}\" - check cut lengths with the retailer",
            request.arrow_length
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArcherProfile, BowConfiguration};

    fn create_request(bow_type: BowType) -> MatchRequest {
        let bow = BowConfiguration::new(50.0, 28.0, bow_type);
        MatchRequest::new(ArcherProfile::new("Test Archer", bow), 28.0)
    }

    fn create_product(spec: SpineSpecification, extra_spines: &[u32]) -> ArrowProduct {
        let mut specs = vec![spec];
        specs.extend(
            extra_spines
                .iter()
                .map(|spine| SpineSpecification::new(*spine, 0.246, 8.0)),
        );
        ArrowProduct::new(1, "Easton Archery", "Axis", "Carbon", specs).unwrap()
    }

    #[test]
    fn test_confidence_from_deviation_ratio() {
        let range = SpineRange {
            minimum: 600.0,
            maximum: 650.0,
        };

        assert_eq!(match_confidence(5.0, &range), ConfidenceLevel::High);
        assert_eq!(match_confidence(-15.0, &range), ConfidenceLevel::Medium);
        assert_eq!(match_confidence(25.0, &range), ConfidenceLevel::Low);
    }

    #[test]
    fn test_reasons() {
        let spec = SpineSpecification::new(600, 0.204, 8.0);
        let product = create_product(spec.clone(), &[300, 400, 500, 700, 800]);
        let mut request = create_request(BowType::Recurve);
        request.preferred_manufacturers = vec!["easton".to_string()];

        let reasons = match_reasons(&product, &spec, 5.0, &request);

        assert_eq!(reasons[0], "Excellent spine match");
        assert!(reasons.contains(&"Excellent availability (6 spine options)".to_string()));
        assert!(reasons.contains(&"Preferred manufacturer (Easton Archery)".to_string()));
        assert!(reasons.contains(&"Small diameter for excellent penetration".to_string()));
    }

    #[test]
    fn test_issues() {
        let spec = SpineSpecification::new(300, 0.360, 13.0).with_length_options(vec![26.0]);
        let product = create_product(spec.clone(), &[]);
        let request = create_request(BowType::Compound);

        let issues = potential_issues(&product, &spec, 50.0, &request);

        assert!(issues.contains(&"Large spine deviation - may require tuning".to_string()));
        assert!(issues.contains(&"Heavy arrow - may reduce arrow speed significantly".to_string()));
        assert!(issues.contains(&"Large diameter - may cause wind drift".to_string()));
        assert!(issues.contains(&"Limited spine options available".to_string()));
        assert!(issues.iter().any(|issue| issue.starts_with("No stocked length")));
    }

    #[test]
    fn test_heavy_arrow_fine_on_traditional() {
        let spec = SpineSpecification::new(500, 0.300, 13.0);
        let product = create_product(spec.clone(), &[400, 600]);
        let request = create_request(BowType::Traditional);

        let issues = potential_issues(&product, &spec, 0.0, &request);
        assert!(issues.is_empty());
    }
}
