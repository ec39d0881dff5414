// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Intelligence Module
//!
//! Nutrition and training calculations. Every function here is synchronous
//! and side-effect free: callers pass records in and receive new records
//! back.
//!
//! This module includes:
//! - Metric and profile validation
//! - BMR, TDEE, goal adjustment, macronutrient and BMI calculations
//! - Body-fat estimation with several interchangeable formulas
//! - Exercise recommendation scoring
//! - Unit conversions

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod body_fat;
pub mod nutrition;
pub mod recommendation_engine;
pub mod units;
pub mod validation;

pub use body_fat::{BodyFatEstimate, BodyFatMethod};
pub use nutrition::{calculate_bmi, categorize_bmi, CalculationError, NutritionCalculator};
pub use recommendation_engine::{Exercise, ExerciseRecommendationEngine, RecommendationCriteria};
pub use validation::{validate_metrics, validate_user_profile, MetricsValidator, ValidationResult};

/// Confidence level of an estimate
///
/// Variants are declared in ascending order so `Ord` ranks `High` first
/// when taking a maximum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(label)
    }
}

/// Round to one decimal place
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
