//! Metric/imperial conversions for user-entered metrics

use serde::{Deserialize, Serialize};

pub const LBS_PER_KG: f64 = 2.204_622_6;
pub const CM_PER_INCH: f64 = 2.54;
const INCHES_PER_FOOT: f64 = 12.0;

/// Height split into whole feet and remaining inches
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeetInches {
    pub feet: u32,
    pub inches: f64,
}

pub fn kg_to_lbs(kg: f64) -> f64 {
    kg * LBS_PER_KG
}

pub fn lbs_to_kg(lbs: f64) -> f64 {
    lbs / LBS_PER_KG
}

pub fn cm_to_inches(cm: f64) -> f64 {
    cm / CM_PER_INCH
}

pub fn inches_to_cm(inches: f64) -> f64 {
    inches * CM_PER_INCH
}

/// Inches are rounded to one decimal; 11.96 in carries into the next foot
pub fn cm_to_feet_inches(cm: f64) -> FeetInches {
    let total_inches = super::round1(cm_to_inches(cm.max(0.0)));
    let feet = (total_inches / INCHES_PER_FOOT).floor();
    let inches = super::round1(total_inches - feet * INCHES_PER_FOOT);

    FeetInches {
        feet: feet as u32,
        inches,
    }
}

pub fn feet_inches_to_cm(height: FeetInches) -> f64 {
    inches_to_cm(f64::from(height.feet) * INCHES_PER_FOOT + height.inches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_round_trip() {
        for kg in [30.0, 70.0, 123.4, 300.0] {
            assert!((lbs_to_kg(kg_to_lbs(kg)) - kg).abs() < 0.1);
        }
        assert!((kg_to_lbs(100.0) - 220.46).abs() < 0.01);
    }

    #[test]
    fn test_length_round_trip() {
        assert!((inches_to_cm(10.0) - 25.4).abs() < 1e-9);
        for cm in [100.0, 175.0, 250.0] {
            assert!((inches_to_cm(cm_to_inches(cm)) - cm).abs() < 0.1);
        }
    }

    #[test]
    fn test_feet_and_inches() {
        let height = cm_to_feet_inches(180.0);
        assert_eq!(height.feet, 5);
        assert_eq!(height.inches, 10.9);

        assert!((feet_inches_to_cm(height) - 180.0).abs() < 1.0);
        assert!((feet_inches_to_cm(FeetInches { feet: 6, inches: 0.0 }) - 182.88).abs() < 1e-9);
    }
}
