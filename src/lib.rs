//! Arrow Match - spine calculation and arrow recommendation engine
//!
//! This library computes the shaft stiffness ("spine") a bow setup needs and
//! ranks catalog arrows against it. Tunable parameters come from a
//! configuration store with built-in defaults behind it; products come from
//! a catalog store. Both stores are traits so callers can plug in their own.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use core::{ArrowMatchingEngine, MatchError, SpineCalculationService, SpineError};
pub use models::{
    ArcherProfile, ArrowMatch, ArrowProduct, BowConfiguration, BowType, MatchRequest,
    RecommendationReport, SpineCalculationResult, SpineSpecification,
};
pub use services::{CalculationConfigProvider, CatalogStore, ConfigStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let baseline = core::compute_baseline(50.0, 28.0, 125.0).unwrap();
        assert_eq!(baseline, 625.0);
        assert_eq!("Recurve".parse::<BowType>().unwrap(), BowType::Recurve);
    }
}
