use thiserror::Error;

/// Errors raised by the spine calculation path
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpineError {
    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("Setup produces a non-positive spine ({0:.1}); check point weight and draw weight")]
    NonPositiveSpine(f64),
}

pub const REFERENCE_ARROW_LENGTH: f64 = 28.0;
pub const REFERENCE_POINT_WEIGHT: f64 = 125.0;

/// Empirical linear spine model, referenced to a compound bow shooting a
/// 28" arrow with a 125 gr point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpineFormula {
    pub draw_weight_factor: f64,
    pub length_adjustment_factor: f64,
    pub point_weight_factor: f64,
    pub reference_length: f64,
    pub reference_point_weight: f64,
}

impl Default for SpineFormula {
    fn default() -> Self {
        Self {
            draw_weight_factor: 12.5,
            length_adjustment_factor: 25.0,
            point_weight_factor: 0.5,
            reference_length: REFERENCE_ARROW_LENGTH,
            reference_point_weight: REFERENCE_POINT_WEIGHT,
        }
    }
}

/// Baseline spine and the two terms that moved it off the reference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub base: f64,
    pub length_adjustment: f64,
    pub point_weight_adjustment: f64,
}

impl Baseline {
    pub fn total(&self) -> f64 {
        self.base + self.length_adjustment + self.point_weight_adjustment
    }
}

impl SpineFormula {
    /// Compute the compound-reference baseline
    ///
    /// ```text
    /// base              = draw_weight * draw_weight_factor
    /// length_adjustment = (arrow_length - reference_length) * length_adjustment_factor
    /// point_adjustment  = (reference_point_weight - point_weight) * point_weight_factor
    /// ```
    ///
    /// A heavier point makes the shaft act weaker, so the required spine
    /// number drops as point weight rises.
    pub fn compute_baseline(
        &self,
        draw_weight: f64,
        arrow_length: f64,
        point_weight: f64,
    ) -> Result<Baseline, SpineError> {
        require_positive("draw_weight", draw_weight)?;
        require_positive("arrow_length", arrow_length)?;
        require_positive("point_weight", point_weight)?;

        Ok(Baseline {
            base: draw_weight * self.draw_weight_factor,
            length_adjustment: (arrow_length - self.reference_length) * self.length_adjustment_factor,
            point_weight_adjustment: (self.reference_point_weight - point_weight)
                * self.point_weight_factor,
        })
    }
}

/// Baseline spine with the stock factors
pub fn compute_baseline(draw_weight: f64, arrow_length: f64, point_weight: f64) -> Result<f64, SpineError> {
    SpineFormula::default()
        .compute_baseline(draw_weight, arrow_length, point_weight)
        .map(|baseline| baseline.total())
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64, SpineError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SpineError::InvalidParameter {
            field,
            reason: format!("must be a positive number, got {}", value),
        })
    }
}
