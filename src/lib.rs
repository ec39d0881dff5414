// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Nutrition Engine
//!
//! Nutrition and training calculations for a fitness application: energy
//! requirements, macronutrient targets, body-fat estimation, legacy profile
//! migration and exercise recommendations.
//!
//! ## Features
//!
//! - **Energy**: Mifflin-St Jeor BMR, activity-scaled TDEE and goal targets
//! - **Macros**: Protein, carbohydrate, fat and fiber targets per goal
//! - **Body fat**: Navy, Jackson-Pollock, Deurenberg and BMI-based estimates
//! - **Migration**: Legacy profiles to the extended profile, with snapshots
//! - **Diet plans**: Remote backend with a local fallback
//! - **Recommendations**: Weighted exercise scoring
//!
//! ## Architecture
//!
//! - **Intelligence**: Pure calculation functions, no I/O
//! - **Models**: Records shared by every layer
//! - **Migration**: Profile conversion and batch reporting
//! - **Database**: SQLite profile store behind the `ProfileStore` trait
//! - **Routes**: warp HTTP API with a uniform response envelope
//!
//! ## Example Usage
//!
//! ```rust
//! use nutrition_engine::intelligence::NutritionCalculator;
//! use nutrition_engine::models::{ActivityLevel, Gender, NutritionGoal, PersonalMetrics};
//!
//! let metrics = PersonalMetrics {
//!     height: 175.0,
//!     weight: 70.0,
//!     age: 30,
//!     gender: Gender::Male,
//!     activity_level: ActivityLevel::Moderate,
//!     fitness_goals: vec![],
//! };
//!
//! let calculator = NutritionCalculator::default();
//! let result = calculator
//!     .calculate(&metrics, NutritionGoal::WeightLoss)
//!     .expect("valid metrics");
//! assert_eq!(result.calorie_requirements.bmr, 1649.0);
//! ```

/// Common data models for profiles and calculation results
pub mod models;

/// Configuration management and persistence
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Nutrition, body-fat and recommendation calculations
pub mod intelligence;

/// Legacy profile migration
pub mod migration;

/// Diet plan generation with backend fallback
pub mod diet_plan;

/// Profile and snapshot storage
pub mod database;

/// HTTP API routes
pub mod routes;

/// Production logging and structured output
pub mod logging;

/// Health checks and monitoring
pub mod health;
