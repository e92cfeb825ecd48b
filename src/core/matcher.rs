use std::sync::Arc;
use thiserror::Error;

use crate::core::{
    advice::{match_confidence, match_reasons, potential_issues},
    calculator::SpineCalculationService,
    filters::{effective_min_spine_options, has_enough_spine_options, matches_material, select_specification},
    formula::SpineError,
    scoring::{calculate_match_score, compare_matches},
};
use crate::models::{
    ArrowMatch, ArrowProduct, CatalogStatus, MatchRequest, RecommendationReport, ScoringWeights,
    SpineCalculationResult,
};
use crate::services::catalog::CatalogStore;
use crate::services::parameters::CalculationConfigProvider;

/// Errors that can occur when matching arrows
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid match request: {0}")]
    InvalidRequest(#[from] validator::ValidationErrors),

    #[error("Spine calculation failed: {0}")]
    Calculation(#[from] SpineError),
}

/// Result of the matching process
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<ArrowMatch>,
    pub total_candidates: usize,
    pub catalog_status: CatalogStatus,
}

/// Main matching orchestrator - implements the multi-stage filtering pipeline
///
/// # Pipeline Stages
/// 1. Catalog search over the spine window (and material preference)
/// 2. Variant lookup per candidate
/// 3. Spine-option threshold, relaxed for coarse-step materials
/// 4. Closest variant selection and scoring
/// 5. Deterministic ranking and truncation
///
/// Read-only: the engine holds no per-request state and may be shared
/// between threads.
#[derive(Clone)]
pub struct ArrowMatchingEngine {
    catalog: Arc<dyn CatalogStore>,
    provider: Arc<CalculationConfigProvider>,
    weights: ScoringWeights,
    search_limit: usize,
    max_limit: usize,
}

impl ArrowMatchingEngine {
    pub fn new(catalog: Arc<dyn CatalogStore>, provider: Arc<CalculationConfigProvider>) -> Self {
        Self {
            catalog,
            provider,
            weights: ScoringWeights::default(),
            search_limit: 50,
            max_limit: 100,
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Cap on products taken from one catalog search
    pub fn with_search_limit(mut self, search_limit: usize) -> Self {
        self.search_limit = search_limit.max(1);
        self
    }

    /// Cap on matches returned, whatever the request asks for
    pub fn with_max_limit(mut self, max_limit: usize) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    /// Ranked matches for a request and its spine calculation
    ///
    /// An empty list means either nothing matched or the catalog could not
    /// be searched; use [`find_matches_detailed`](Self::find_matches_detailed)
    /// to tell them apart.
    pub fn find_matches(
        &self,
        request: &MatchRequest,
        calculation: &SpineCalculationResult,
    ) -> Result<Vec<ArrowMatch>, MatchError> {
        Ok(self.find_matches_detailed(request, calculation)?.matches)
    }

    /// Find matches for a request
    ///
    /// Only an invalid request is an error. Catalog failures come back as
    /// an empty result with [`CatalogStatus::Unavailable`].
    pub fn find_matches_detailed(
        &self,
        request: &MatchRequest,
        calculation: &SpineCalculationResult,
    ) -> Result<MatchResult, MatchError> {
        request.validate_all()?;

        let window = calculation.spine_range;
        let material = request.material_preference.as_deref();

        // Stage 1: Catalog search
        let summaries = match self
            .catalog
            .search_by_spine_range(window.minimum, window.maximum, material, self.search_limit)
        {
            Ok(summaries) => summaries,
            Err(e) => {
                tracing::warn!("Catalog search failed, returning no candidates: {}", e);
                return Ok(MatchResult {
                    matches: Vec::new(),
                    total_candidates: 0,
                    catalog_status: CatalogStatus::Unavailable {
                        reason: e.to_string(),
                    },
                });
            }
        };
        let total_candidates = summaries.len();

        let material_minimum = material
            .and_then(|material| self.provider.material_min_spine_options(material).value);
        let threshold = effective_min_spine_options(request.min_spine_options, material_minimum);
        let reference_diameter = self
            .provider
            .reference_diameter(calculation.bow_type)
            .value;
        let weights = self.weights.for_goals(&request.tuning_goals);

        tracing::debug!(
            "Matching {} candidates against spine {:.1} (threshold {} options)",
            total_candidates,
            calculation.calculated_spine,
            threshold
        );

        let mut failed_lookups = 0;

        let mut matches: Vec<ArrowMatch> = summaries
            .into_iter()
            // Stores may ignore the material hint
            .filter(|summary| matches_material(&summary.material, material))
            // Stage 2: Variant lookup
            .filter_map(|summary| {
                let product_id = summary.id;
                let product = self
                    .catalog
                    .get_variants(product_id)
                    .and_then(|variants| ArrowProduct::from_summary(summary, variants));
                match product {
                    Ok(product) => Some(product),
                    Err(e) => {
                        tracing::warn!("Skipping product {}: {}", product_id, e);
                        failed_lookups += 1;
                        None
                    }
                }
            })
            // Stage 3: Spine-option threshold
            .filter(|product| {
                let enough = has_enough_spine_options(product, threshold);
                if !enough {
                    tracing::debug!(
                        "Skipping {} {}: {} spine options, need {}",
                        product.manufacturer,
                        product.model_name,
                        product.spine_option_count(),
                        threshold
                    );
                }
                enough
            })
            // Stage 4: Pick a variant and score it
            .filter_map(|product| {
                let specification = select_specification(
                    product.spine_specifications(),
                    calculation.calculated_spine,
                    reference_diameter,
                )?
                .clone();

                let spine_deviation = f64::from(specification.spine) - calculation.calculated_spine;
                let (match_score, _) = calculate_match_score(
                    &product,
                    &specification,
                    request,
                    calculation.calculated_spine,
                    &window,
                    reference_diameter,
                    &weights,
                );

                Some(ArrowMatch {
                    matched_spine: specification.spine,
                    spine_deviation,
                    match_score,
                    outer_diameter: specification.outer_diameter,
                    gpi_weight: specification.gpi_weight,
                    confidence_level: match_confidence(spine_deviation, &window),
                    match_reasons: match_reasons(&product, &specification, spine_deviation, request),
                    potential_issues: potential_issues(
                        &product,
                        &specification,
                        spine_deviation,
                        request,
                    ),
                    specification,
                    product,
                })
            })
            .collect();

        // Stage 5: Rank and limit results
        matches.sort_by(|a, b| compare_matches(a, b, reference_diameter));
        matches.truncate(request.max_results.min(self.max_limit));

        let catalog_status = if failed_lookups > 0 {
            CatalogStatus::Degraded { failed_lookups }
        } else {
            CatalogStatus::Available
        };

        tracing::info!(
            "Matched {} arrows from {} candidates for spine {:.1}",
            matches.len(),
            total_candidates,
            calculation.calculated_spine
        );

        Ok(MatchResult {
            matches,
            total_candidates,
            catalog_status,
        })
    }

    /// Calculate spine for the request, match it and bundle a report
    pub fn recommend(&self, request: &MatchRequest) -> Result<RecommendationReport, MatchError> {
        request.validate_all()?;

        let calculation = SpineCalculationService::new(self.provider.clone())
            .calculate_for_request(request)?;
        let result = self.find_matches_detailed(request, &calculation)?;

        Ok(RecommendationReport::new(
            calculation,
            result.matches,
            result.total_candidates,
            result.catalog_status,
        ))
    }
}
