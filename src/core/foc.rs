use serde::{Deserialize, Serialize};

use crate::core::formula::{require_positive, SpineError};

/// Front-of-centre balance for an assembled arrow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocResult {
    pub foc_percentage: f64,
    /// Inches from the nock end
    pub balance_point: f64,
    pub physical_center: f64,
    pub total_weight: f64,
    pub front_weight: f64,
    pub back_weight: f64,
}

/// Estimate FOC assuming the shaft mass is spread evenly along its length
///
/// All weights in grains, length in inches. The point and insert count
/// towards the front half, the nock and fletching towards the back.
pub fn calculate_foc(
    arrow_length: f64,
    point_weight: f64,
    shaft_weight: f64,
    nock_weight: f64,
    fletching_weight: f64,
    insert_weight: f64,
) -> Result<FocResult, SpineError> {
    require_positive("arrow_length", arrow_length)?;
    require_positive("point_weight", point_weight)?;
    require_positive("shaft_weight", shaft_weight)?;
    require_non_negative("nock_weight", nock_weight)?;
    require_non_negative("fletching_weight", fletching_weight)?;
    require_non_negative("insert_weight", insert_weight)?;

    let total_weight = point_weight + shaft_weight + nock_weight + fletching_weight + insert_weight;
    let front_weight = point_weight + insert_weight + shaft_weight / 2.0;
    let back_weight = nock_weight + fletching_weight + shaft_weight / 2.0;

    let physical_center = arrow_length / 2.0;
    let balance_point = physical_center + ((front_weight - back_weight) / total_weight) * physical_center;
    let foc_percentage = (balance_point - physical_center) / arrow_length * 100.0;

    Ok(FocResult {
        foc_percentage: round_to(foc_percentage, 2),
        balance_point: round_to(balance_point, 3),
        physical_center,
        total_weight,
        front_weight,
        back_weight,
    })
}

fn require_non_negative(field: &'static str, value: f64) -> Result<f64, SpineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(SpineError::InvalidParameter {
            field,
            reason: format!("must be zero or positive, got {}", value),
        })
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typical_hunting_arrow() {
        // 28" shaft at 8 GPI with a 125 gr point
        let foc = calculate_foc(28.0, 125.0, 224.0, 10.0, 15.0, 15.0).unwrap();

        assert_eq!(foc.total_weight, 389.0);
        assert_eq!(foc.front_weight, 252.0);
        assert_eq!(foc.back_weight, 137.0);
        assert_eq!(foc.physical_center, 14.0);
        assert_eq!(foc.foc_percentage, 14.78);
        assert!(foc.balance_point > foc.physical_center);
    }

    #[test]
    fn test_heavier_point_raises_foc() {
        let light = calculate_foc(28.0, 100.0, 224.0, 10.0, 15.0, 15.0).unwrap();
        let heavy = calculate_foc(28.0, 200.0, 224.0, 10.0, 15.0, 15.0).unwrap();
        assert!(heavy.foc_percentage > light.foc_percentage);
    }

    #[test]
    fn test_rejects_invalid_components() {
        let err = calculate_foc(0.0, 125.0, 224.0, 10.0, 15.0, 15.0).unwrap_err();
        assert!(matches!(err, SpineError::InvalidParameter { field: "arrow_length", .. }));

        let err = calculate_foc(28.0, 125.0, 224.0, -1.0, 15.0, 15.0).unwrap_err();
        assert!(matches!(err, SpineError::InvalidParameter { field: "nock_weight", .. }));
    }
}
