// Core algorithm exports
pub mod advice;
pub mod calculator;
pub mod filters;
pub mod foc;
pub mod formula;
pub mod matcher;
pub mod scoring;

pub use calculator::SpineCalculationService;
pub use filters::{matches_material, normalize_material, select_specification};
pub use foc::{calculate_foc, FocResult};
pub use formula::{compute_baseline, Baseline, SpineError, SpineFormula};
pub use matcher::{ArrowMatchingEngine, MatchError, MatchResult};
pub use scoring::{calculate_match_score, compare_matches, ScoreBreakdown};
