//! Validation of user-supplied metrics and structured profiles
//!
//! Validation never fails with an error: each violated constraint becomes
//! one human-readable message in the returned list.

use crate::config::nutrition_config::{Bounds, ValidationRanges};
use crate::constants::body_fat;
use crate::models::{PersonalMetrics, UserProfileExtended, REQUIRED_PROFILE_FIELDS};
use serde::{Deserialize, Serialize};

/// Outcome of validating a [`PersonalMetrics`] record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Outcome of validating a [`UserProfileExtended`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    /// Required fields that hold no value
    pub missing_fields: Vec<String>,
    /// Share of required fields that are set (0-100)
    pub completion_percentage: f64,
}

/// Range checks for physical metrics
#[derive(Debug, Clone)]
pub struct MetricsValidator {
    ranges: ValidationRanges,
}

impl MetricsValidator {
    pub fn new(ranges: ValidationRanges) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &ValidationRanges {
        &self.ranges
    }

    /// Check height, weight and age against the configured ranges
    ///
    /// Gender and activity level are closed enums, so any value that
    /// deserialized is already valid.
    pub fn validate(&self, metrics: &PersonalMetrics) -> ValidationResult {
        let mut errors = Vec::new();

        check_range(&mut errors, "Height", metrics.height, self.ranges.height_cm, " cm");
        check_range(&mut errors, "Weight", metrics.weight, self.ranges.weight_kg, " kg");
        check_range(
            &mut errors,
            "Age",
            f64::from(metrics.age),
            self.ranges.age_years,
            " years",
        );

        ValidationResult::from_errors(errors)
    }

    /// Check a structured profile for completeness and range violations
    pub fn validate_profile(&self, profile: &UserProfileExtended) -> ProfileValidation {
        let mut errors = Vec::new();
        let missing_fields: Vec<String> = REQUIRED_PROFILE_FIELDS
            .iter()
            .filter(|field| !profile.has_field(field))
            .map(|field| field.to_string())
            .collect();

        for field in &missing_fields {
            errors.push(format!("{} is required", field));
        }

        let r = &self.ranges;
        if let Some(height) = profile.height {
            check_range(&mut errors, "Height", height, r.height_cm, " cm");
        }
        if let Some(weight) = profile.weight {
            check_range(&mut errors, "Weight", weight, r.weight_kg, " kg");
        }
        if let Some(age) = profile.age {
            check_range(&mut errors, "Age", f64::from(age), r.age_years, " years");
        }
        if let Some(meals) = profile.meals_per_day {
            check_range(&mut errors, "Meals per day", f64::from(meals), r.meals_per_day, "");
        }
        if let Some(snacks) = profile.snacks_per_day {
            check_range(&mut errors, "Snacks per day", f64::from(snacks), r.snacks_per_day, "");
        }
        if let Some(days) = profile.workout_days_per_week {
            check_range(
                &mut errors,
                "Workout days per week",
                f64::from(days),
                r.workout_days_per_week,
                "",
            );
        }
        if let Some(weeks) = profile.plan_duration_weeks {
            check_range(
                &mut errors,
                "Plan duration",
                f64::from(weeks),
                r.plan_duration_weeks,
                " weeks",
            );
        }
        if let Some(cuisine) = &profile.cuisine_preference {
            if cuisine.trim().is_empty() {
                errors.push("Cuisine preference must not be empty".to_string());
            }
        }
        if let Some(percentage) = profile.body_fat_percentage {
            if !(body_fat::MEASURED_MIN_PERCENT..=body_fat::MEASURED_MAX_PERCENT)
                .contains(&percentage)
            {
                errors.push(format!(
                    "Body fat percentage must be between {} and {}",
                    body_fat::MEASURED_MIN_PERCENT,
                    body_fat::MEASURED_MAX_PERCENT
                ));
            }
        }

        let present = REQUIRED_PROFILE_FIELDS.len() - missing_fields.len();
        let completion_percentage =
            (present as f64 / REQUIRED_PROFILE_FIELDS.len() as f64 * 100.0).round();

        ProfileValidation {
            is_valid: errors.is_empty(),
            errors,
            missing_fields,
            completion_percentage,
        }
    }
}

impl Default for MetricsValidator {
    fn default() -> Self {
        Self::new(ValidationRanges::default())
    }
}

/// Validate metrics against the default ranges
pub fn validate_metrics(metrics: &PersonalMetrics) -> ValidationResult {
    MetricsValidator::default().validate(metrics)
}

/// Validate a profile against the default ranges
pub fn validate_user_profile(profile: &UserProfileExtended) -> ProfileValidation {
    MetricsValidator::default().validate_profile(profile)
}

fn check_range(errors: &mut Vec<String>, label: &str, value: f64, bounds: Bounds, unit: &str) {
    if !bounds.contains(value) {
        errors.push(format!(
            "{} must be between {} and {}{}",
            label, bounds.min, bounds.max, unit
        ));
    }
}
