// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ArcherProfile, ArrowMatch, ArrowProduct, BowConfiguration, BowType, CalculationSource,
    ConfidenceLevel, ExperienceLevel, MassPreference, MaterialProperties, ScoringWeights,
    SpineAdjustments, SpineCalculationResult, SpineRange, SpineSpecification, TuningGoal,
};
pub use requests::MatchRequest;
pub use responses::{CatalogStatus, RecommendationReport};
