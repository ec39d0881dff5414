// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Formula constants and environment-based configuration values.
//! Tunable tables (activity multipliers, goal offsets, macro splits) live in
//! [`crate::config::NutritionConfig`]; the values here are fixed by the
//! published equations.

/// Energy density of macronutrients
pub mod energy {
    /// kcal per gram of protein
    pub const PROTEIN_KCAL_PER_GRAM: f64 = 4.0;
    /// kcal per gram of carbohydrate
    pub const CARBS_KCAL_PER_GRAM: f64 = 4.0;
    /// kcal per gram of fat
    pub const FAT_KCAL_PER_GRAM: f64 = 9.0;
}

/// Mifflin-St Jeor (1990) coefficients
pub mod mifflin_st_jeor {
    pub const WEIGHT_COEF: f64 = 10.0;
    pub const HEIGHT_COEF: f64 = 6.25;
    pub const AGE_COEF: f64 = 5.0;
    pub const MALE_CONSTANT: f64 = 5.0;
    /// Applied to female and other
    pub const FEMALE_CONSTANT: f64 = -161.0;
}

/// Body-fat estimation constants
pub mod body_fat {
    /// Lower clamp for any estimate (%)
    pub const MIN_PERCENT: f64 = 3.0;
    /// Upper clamp for any estimate (%)
    pub const MAX_PERCENT: f64 = 50.0;

    /// Plausible range for a measured value supplied by the user (%)
    pub const MEASURED_MIN_PERCENT: f64 = 2.0;
    pub const MEASURED_MAX_PERCENT: f64 = 70.0;

    pub const BMI_COEF: f64 = 1.20;
    pub const AGE_COEF: f64 = 0.23;
    pub const MALE_OFFSET: f64 = -16.2;
    pub const FEMALE_OFFSET: f64 = -5.4;

    /// Deurenberg sex term
    pub const DEURENBERG_SEX_COEF: f64 = 10.8;
    pub const DEURENBERG_CONSTANT: f64 = 5.4;

    /// Siri (1961): %BF = 495 / density - 450
    pub const SIRI_NUMERATOR: f64 = 495.0;
    pub const SIRI_OFFSET: f64 = 450.0;
}

/// Low-calorie warning thresholds (kcal/day)
pub mod safety {
    pub const MIN_CALORIES_MALE: f64 = 1500.0;
    pub const MIN_CALORIES_FEMALE: f64 = 1200.0;
    /// Recommended daily water intake per kg of body weight (liters)
    pub const WATER_LITERS_PER_KG: f64 = 0.035;
}

/// API error codes returned in the `{success: false}` envelope
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const BACKEND_ERROR: &str = "BACKEND_ERROR";
    pub const BACKEND_UNAVAILABLE: &str = "BACKEND_UNAVAILABLE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Service identity
pub mod service {
    pub const SERVICE_NAME: &str = "nutrition-engine";
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Environment-based configuration
pub mod env_config {
    use std::env;

    /// Get HTTP server port from environment or default
    pub fn http_port() -> u16 {
        env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8081".to_string())
            .parse()
            .unwrap_or(8081)
    }

    /// Get database URL from environment or default
    pub fn database_url() -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/profiles.db".to_string())
    }

    /// Get the remote diet-plan backend URL, if configured
    pub fn diet_backend_url() -> Option<String> {
        env::var("DIET_BACKEND_URL").ok().filter(|url| !url.is_empty())
    }

    /// Get the diet-plan backend timeout from environment or default
    pub fn diet_backend_timeout_secs() -> u64 {
        env::var("DIET_BACKEND_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10)
    }

    /// Get the nutrition config file path, if configured
    pub fn nutrition_config_path() -> Option<String> {
        env::var("NUTRITION_CONFIG_PATH").ok()
    }

    /// Get log level from environment or default
    pub fn log_level() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    }
}
