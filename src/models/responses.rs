use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{ArrowMatch, SpineCalculationResult};

/// Whether the catalog could be searched for this request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CatalogStatus {
    Available,
    /// Search worked but some products' variants could not be read
    Degraded { failed_lookups: usize },
    /// Search failed; an empty match list means nothing here
    Unavailable { reason: String },
}

impl CatalogStatus {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CatalogStatus::Unavailable { .. })
    }
}

/// Calculation plus ranked matches, as handed to the archer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub generated_at: DateTime<Utc>,
    pub calculation: SpineCalculationResult,
    pub matches: Vec<ArrowMatch>,
    pub total_candidates: usize,
    pub catalog_status: CatalogStatus,
    pub summary: String,
}

impl RecommendationReport {
    pub fn new(
        calculation: SpineCalculationResult,
        matches: Vec<ArrowMatch>,
        total_candidates: usize,
        catalog_status: CatalogStatus,
    ) -> Self {
        let summary = summarize(&calculation, &matches, &catalog_status);
        Self {
            generated_at: Utc::now(),
            calculation,
            matches,
            total_candidates,
            catalog_status,
            summary,
        }
    }
}

fn summarize(
    calculation: &SpineCalculationResult,
    matches: &[ArrowMatch],
    catalog_status: &CatalogStatus,
) -> String {
    let window = format!(
        "{:.0}-{:.0}",
        calculation.spine_range.minimum, calculation.spine_range.maximum
    );

    if let CatalogStatus::Unavailable { reason } = catalog_status {
        return format!(
            "Arrow catalog temporarily unavailable ({}); calculated spine {:.0} (window {}), try the search again shortly",
            reason, calculation.calculated_spine, window
        );
    }

    let mut summary = match matches.first() {
        None => format!(
            "No arrows matched spine window {}; widen your criteria (material preference or minimum spine options)",
            window
        ),
        Some(top) => format!(
            "{} arrow(s) matched spine window {}; top pick {} {} at spine {} (score {:.1})",
            matches.len(),
            window,
            top.manufacturer(),
            top.model_name(),
            top.matched_spine,
            top.match_score
        ),
    };

    if let CatalogStatus::Degraded { failed_lookups } = catalog_status {
        summary.push_str(&format!(
            "; {} product(s) could not be checked",
            failed_lookups
        ));
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{
        BowType, CalculationSource, ConfidenceLevel, SpineAdjustments, SpineRange,
    };

    fn create_calculation() -> SpineCalculationResult {
        SpineCalculationResult {
            calculated_spine: 625.0,
            base_spine: 625.0,
            spine_range: SpineRange {
                minimum: 600.0,
                maximum: 650.0,
            },
            confidence: 0.9,
            confidence_level: ConfidenceLevel::High,
            adjustments: SpineAdjustments::default(),
            source: CalculationSource::Configured,
            bow_type: BowType::Compound,
            fallback_parameters: Vec::new(),
            material_info: None,
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_outage_and_empty_result_read_differently() {
        let outage = RecommendationReport::new(
            create_calculation(),
            Vec::new(),
            0,
            CatalogStatus::Unavailable {
                reason: "timeout".to_string(),
            },
        );
        let empty = RecommendationReport::new(create_calculation(), Vec::new(), 0, CatalogStatus::Available);

        assert!(outage.summary.contains("temporarily unavailable"));
        assert!(empty.summary.contains("widen your criteria"));
        assert_ne!(outage.summary, empty.summary);
    }

    #[test]
    fn test_catalog_status_serialization() {
        let json = serde_json::to_value(CatalogStatus::Degraded { failed_lookups: 2 }).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["failed_lookups"], 2);

        let json = serde_json::to_value(CatalogStatus::Available).unwrap();
        assert_eq!(json["status"], "available");
    }
}
