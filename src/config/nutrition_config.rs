// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Nutrition-specific configuration: formula tables, validation ranges and
//! migration defaults

use crate::models::{
    ActivityLevel, BudgetLevel, CookingTime, DietType, NutritionGoal, SubscriptionTier,
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main nutrition configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionConfig {
    /// Fiber grams recommended per 1000 kcal
    pub fiber_per_1000_kcal: f64,
    pub activity_multipliers: ActivityMultipliers,
    pub goal_adjustments: GoalAdjustments,
    pub macro_splits: MacroSplits,
    pub validation: ValidationRanges,
    pub migration_defaults: MigrationDefaults,
}

/// TDEE multipliers per activity level
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityMultipliers {
    pub sedentary: f64,
    pub light: f64,
    pub moderate: f64,
    pub active: f64,
    pub very_active: f64,
}

/// Caloric offset applied to TDEE per goal (kcal/day)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalAdjustments {
    pub weight_loss: f64,
    pub muscle_gain: f64,
    pub maintenance: f64,
    pub endurance: f64,
}

/// Share of target calories per macronutrient
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MacroSplit {
    pub protein: f64,
    pub carbohydrates: f64,
    pub fats: f64,
}

/// Macro split per goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MacroSplits {
    pub weight_loss: MacroSplit,
    pub muscle_gain: MacroSplit,
    pub maintenance: MacroSplit,
    pub endurance: MacroSplit,
}

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Accepted ranges for user-supplied values
///
/// One set of ranges serves both metric validation and profile validation,
/// so the age ceiling cannot drift between the two.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValidationRanges {
    pub height_cm: Bounds,
    pub weight_kg: Bounds,
    pub age_years: Bounds,
    pub meals_per_day: Bounds,
    pub snacks_per_day: Bounds,
    pub workout_days_per_week: Bounds,
    pub plan_duration_weeks: Bounds,
}

/// Values substituted for missing preferences when migrating legacy profiles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MigrationDefaults {
    pub activity_level: ActivityLevel,
    pub diet_type: DietType,
    pub meals_per_day: u8,
    pub snacks_per_day: u8,
    pub cooking_time: CookingTime,
    pub cuisine_preference: String,
    pub budget_level: BudgetLevel,
    pub subscription_tier: SubscriptionTier,
    pub plan_duration_weeks: u8,
}

impl NutritionConfig {
    /// Load nutrition configuration from file or use defaults
    pub fn load(path: Option<String>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from_file(&config_path);
        }

        if Path::new("nutrition_config.toml").exists() {
            return Self::load_from_file("nutrition_config.toml");
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read nutrition config file: {}", path))?;

        let config: NutritionConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse nutrition config file: {}", path))?;

        config
            .validate()
            .with_context(|| format!("Invalid nutrition config file: {}", path))?;

        Ok(config)
    }

    /// Check the internal consistency of the formula tables
    pub fn validate(&self) -> Result<()> {
        let multipliers: Vec<f64> = ActivityLevel::ALL
            .iter()
            .map(|level| self.activity_multiplier(*level))
            .collect();
        if multipliers.iter().any(|m| *m <= 1.0) {
            bail!("Activity multipliers must be greater than 1.0");
        }
        if multipliers.windows(2).any(|pair| pair[1] <= pair[0]) {
            bail!("Activity multipliers must strictly increase from sedentary to very_active");
        }

        for goal in NutritionGoal::ALL {
            let split = self.macro_split(goal);
            let total = split.protein + split.carbohydrates + split.fats;
            if (total - 1.0).abs() > 0.001 {
                bail!("Macro split for {} sums to {:.3}, expected 1.0", goal, total);
            }
            if split.protein <= 0.0 || split.carbohydrates <= 0.0 || split.fats <= 0.0 {
                bail!("Macro split for {} must have positive shares", goal);
            }
        }

        if self.fiber_per_1000_kcal <= 0.0 {
            bail!("fiber_per_1000_kcal must be positive");
        }

        let v = &self.validation;
        let ranges = [
            ("height_cm", v.height_cm),
            ("weight_kg", v.weight_kg),
            ("age_years", v.age_years),
            ("meals_per_day", v.meals_per_day),
            ("snacks_per_day", v.snacks_per_day),
            ("workout_days_per_week", v.workout_days_per_week),
            ("plan_duration_weeks", v.plan_duration_weeks),
        ];
        for (name, bounds) in ranges {
            if !(bounds.min.is_finite() && bounds.max.is_finite() && bounds.min <= bounds.max) {
                bail!(
                    "Validation range {} must have finite min <= max, got {}..{}",
                    name,
                    bounds.min,
                    bounds.max
                );
            }
        }

        Ok(())
    }

    /// TDEE multiplier for an activity level
    pub fn activity_multiplier(&self, level: ActivityLevel) -> f64 {
        let m = &self.activity_multipliers;
        match level {
            ActivityLevel::Sedentary => m.sedentary,
            ActivityLevel::Light => m.light,
            ActivityLevel::Moderate => m.moderate,
            ActivityLevel::Active => m.active,
            ActivityLevel::VeryActive => m.very_active,
        }
    }

    /// Caloric offset for a goal
    pub fn goal_adjustment(&self, goal: NutritionGoal) -> f64 {
        let g = &self.goal_adjustments;
        match goal {
            NutritionGoal::WeightLoss => g.weight_loss,
            NutritionGoal::MuscleGain => g.muscle_gain,
            NutritionGoal::Maintenance => g.maintenance,
            NutritionGoal::Endurance => g.endurance,
        }
    }

    /// Macro split for a goal
    pub fn macro_split(&self, goal: NutritionGoal) -> MacroSplit {
        let s = &self.macro_splits;
        match goal {
            NutritionGoal::WeightLoss => s.weight_loss,
            NutritionGoal::MuscleGain => s.muscle_gain,
            NutritionGoal::Maintenance => s.maintenance,
            NutritionGoal::Endurance => s.endurance,
        }
    }
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            fiber_per_1000_kcal: 14.0,
            activity_multipliers: ActivityMultipliers::default(),
            goal_adjustments: GoalAdjustments::default(),
            macro_splits: MacroSplits::default(),
            validation: ValidationRanges::default(),
            migration_defaults: MigrationDefaults::default(),
        }
    }
}

impl Default for ActivityMultipliers {
    fn default() -> Self {
        Self {
            sedentary: 1.2,
            light: 1.375,
            moderate: 1.55,
            active: 1.725,
            very_active: 1.9,
        }
    }
}

impl Default for GoalAdjustments {
    fn default() -> Self {
        Self {
            weight_loss: -500.0,
            muscle_gain: 300.0,
            maintenance: 0.0,
            endurance: 400.0,
        }
    }
}

impl Default for MacroSplits {
    fn default() -> Self {
        Self {
            weight_loss: MacroSplit { protein: 0.30, carbohydrates: 0.40, fats: 0.30 },
            muscle_gain: MacroSplit { protein: 0.30, carbohydrates: 0.45, fats: 0.25 },
            maintenance: MacroSplit { protein: 0.25, carbohydrates: 0.50, fats: 0.25 },
            endurance: MacroSplit { protein: 0.20, carbohydrates: 0.55, fats: 0.25 },
        }
    }
}

impl Default for ValidationRanges {
    fn default() -> Self {
        Self {
            height_cm: Bounds::new(100.0, 250.0),
            weight_kg: Bounds::new(30.0, 300.0),
            age_years: Bounds::new(13.0, 120.0),
            meals_per_day: Bounds::new(1.0, 6.0),
            snacks_per_day: Bounds::new(0.0, 4.0),
            workout_days_per_week: Bounds::new(1.0, 7.0),
            plan_duration_weeks: Bounds::new(1.0, 52.0),
        }
    }
}

impl Default for MigrationDefaults {
    fn default() -> Self {
        Self {
            activity_level: ActivityLevel::Moderate,
            diet_type: DietType::Omnivore,
            meals_per_day: 3,
            snacks_per_day: 1,
            cooking_time: CookingTime::Moderate,
            cuisine_preference: "international".to_string(),
            budget_level: BudgetLevel::Medium,
            subscription_tier: SubscriptionTier::Free,
            plan_duration_weeks: 4,
        }
    }
}
