// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Energy and macronutrient calculations
//!
//! # References
//!
//! - Mifflin, M.D., et al. (1990). A new predictive equation for resting
//!   energy expenditure. *American Journal of Clinical Nutrition*, 51(2),
//!   241-247.
//! - WHO body-mass-index classification for adults.

use super::validation::MetricsValidator;
use crate::config::NutritionConfig;
use crate::constants::{energy, mifflin_st_jeor, safety};
use crate::models::{
    ActivityLevel, BmiCategory, CalorieRequirements, Gender, MacronutrientBreakdown,
    NutritionCalculationResult, NutritionGoal, PersonalMetrics,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors raised by the calculation functions
///
/// A non-positive input is a caller bug: validate metrics first.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationError {
    #[error("{field} must be greater than zero (got {value})")]
    NonPositiveInput { field: &'static str, value: f64 },

    #[error("Invalid metrics: {}", .0.join("; "))]
    InvalidMetrics(Vec<String>),
}

/// Target calories for a goal and the offset that produced them
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GoalTarget {
    pub target_calories: f64,
    pub adjustment: f64,
}

/// Calculator for BMR, TDEE, calorie targets and macronutrients
#[derive(Debug, Clone, Default)]
pub struct NutritionCalculator {
    config: NutritionConfig,
}

impl NutritionCalculator {
    pub fn new(config: NutritionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NutritionConfig {
        &self.config
    }

    /// Basal Metabolic Rate via Mifflin-St Jeor, rounded to whole kcal
    ///
    /// `10·weight + 6.25·height − 5·age`, then `+5` for men and `−161`
    /// otherwise.
    pub fn calculate_bmr(&self, metrics: &PersonalMetrics) -> Result<f64, CalculationError> {
        ensure_positive("weight", metrics.weight)?;
        ensure_positive("height", metrics.height)?;
        ensure_positive("age", f64::from(metrics.age))?;

        let base = mifflin_st_jeor::WEIGHT_COEF * metrics.weight
            + mifflin_st_jeor::HEIGHT_COEF * metrics.height
            - mifflin_st_jeor::AGE_COEF * f64::from(metrics.age);

        let bmr = match metrics.gender {
            Gender::Male => base + mifflin_st_jeor::MALE_CONSTANT,
            Gender::Female | Gender::Other => base + mifflin_st_jeor::FEMALE_CONSTANT,
        };

        Ok(bmr.round())
    }

    /// Total Daily Energy Expenditure: BMR scaled by the activity multiplier
    pub fn calculate_tdee(&self, bmr: f64, activity_level: ActivityLevel) -> f64 {
        (bmr * self.config.activity_multiplier(activity_level)).round()
    }

    /// Apply the goal's fixed caloric offset to TDEE
    ///
    /// No clamping is applied; low results are flagged by
    /// [`Self::calculate`] through its recommendations.
    pub fn calculate_target_calories(&self, tdee: f64, goal: NutritionGoal) -> GoalTarget {
        let adjustment = self.config.goal_adjustment(goal);
        GoalTarget {
            target_calories: (tdee + adjustment).round(),
            adjustment,
        }
    }

    /// Split target calories into macronutrient grams
    ///
    /// Each macro is rounded independently, so the reconstructed calories
    /// may differ from the target by a few kcal.
    pub fn calculate_macronutrients(
        &self,
        target_calories: f64,
        goal: NutritionGoal,
    ) -> MacronutrientBreakdown {
        let split = self.config.macro_split(goal);

        MacronutrientBreakdown {
            protein: (target_calories * split.protein / energy::PROTEIN_KCAL_PER_GRAM).round(),
            carbohydrates: (target_calories * split.carbohydrates / energy::CARBS_KCAL_PER_GRAM)
                .round(),
            fats: (target_calories * split.fats / energy::FAT_KCAL_PER_GRAM).round(),
            fiber: (target_calories / 1000.0 * self.config.fiber_per_1000_kcal).round(),
        }
    }

    /// BMR, TDEE and goal target in one record
    pub fn calculate_calorie_requirements(
        &self,
        metrics: &PersonalMetrics,
        goal: NutritionGoal,
    ) -> Result<CalorieRequirements, CalculationError> {
        let bmr = self.calculate_bmr(metrics)?;
        let tdee = self.calculate_tdee(bmr, metrics.activity_level);
        let target = self.calculate_target_calories(tdee, goal);

        Ok(CalorieRequirements {
            bmr,
            tdee,
            target_calories: target.target_calories,
            goal_adjustment: target.adjustment,
        })
    }

    /// Full calculation: validates the metrics, then derives BMI, calorie
    /// requirements, macros and recommendations
    pub fn calculate(
        &self,
        metrics: &PersonalMetrics,
        goal: NutritionGoal,
    ) -> Result<NutritionCalculationResult, CalculationError> {
        let validation = MetricsValidator::new(self.config.validation).validate(metrics);
        if !validation.is_valid {
            return Err(CalculationError::InvalidMetrics(validation.errors));
        }

        let bmi = calculate_bmi(metrics.height, metrics.weight)?;
        let bmi_category = categorize_bmi(bmi);
        let calorie_requirements = self.calculate_calorie_requirements(metrics, goal)?;
        let macronutrients =
            self.calculate_macronutrients(calorie_requirements.target_calories, goal);

        debug!(
            bmi = bmi,
            bmr = calorie_requirements.bmr,
            tdee = calorie_requirements.tdee,
            target = calorie_requirements.target_calories,
            goal = %goal,
            "Nutrition targets calculated"
        );

        let recommendations = build_recommendations(
            metrics,
            goal,
            bmi_category,
            &calorie_requirements,
            &macronutrients,
        );

        Ok(NutritionCalculationResult {
            bmi,
            bmi_category,
            calorie_requirements,
            macronutrients,
            recommendations,
        })
    }
}

/// Body Mass Index rounded to one decimal
pub fn calculate_bmi(height_cm: f64, weight_kg: f64) -> Result<f64, CalculationError> {
    ensure_positive("height", height_cm)?;
    ensure_positive("weight", weight_kg)?;

    let height_m = height_cm / 100.0;
    Ok(super::round1(weight_kg / (height_m * height_m)))
}

/// WHO band for a BMI; each boundary belongs to the upper band
pub fn categorize_bmi(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

fn ensure_positive(field: &'static str, value: f64) -> Result<(), CalculationError> {
    // NaN fails this comparison too
    if value > 0.0 {
        Ok(())
    } else {
        Err(CalculationError::NonPositiveInput { field, value })
    }
}

fn build_recommendations(
    metrics: &PersonalMetrics,
    goal: NutritionGoal,
    bmi_category: BmiCategory,
    calories: &CalorieRequirements,
    macros: &MacronutrientBreakdown,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    recommendations.push(
        match bmi_category {
            BmiCategory::Underweight => {
                "Your BMI is below the healthy range. Favour nutrient-dense meals and avoid large caloric deficits."
            }
            BmiCategory::Normal => {
                "Your BMI is in the healthy range. Consistent meals and regular training will help you keep it there."
            }
            BmiCategory::Overweight => {
                "Your BMI is above the healthy range. A moderate caloric deficit with adequate protein supports steady fat loss."
            }
            BmiCategory::Obese => {
                "Your BMI is in the obese range. Consider involving a healthcare professional when planning weight loss."
            }
        }
        .to_string(),
    );

    recommendations.push(
        match goal {
            NutritionGoal::WeightLoss => {
                "Aim to lose 0.5 to 1 kg per week; faster loss tends to cost muscle."
            }
            NutritionGoal::MuscleGain => {
                "Pair the caloric surplus with progressive resistance training to favour muscle over fat gain."
            }
            NutritionGoal::Maintenance => {
                "Track your weight weekly and adjust intake if it drifts by more than 1 kg."
            }
            NutritionGoal::Endurance => {
                "Time most of your carbohydrates around long or intense sessions to keep glycogen topped up."
            }
        }
        .to_string(),
    );

    recommendations.push(format!(
        "Spread your {:.0} g of protein across your meals, roughly 20 to 40 g per sitting.",
        macros.protein
    ));

    let water_liters = super::round1(metrics.weight * safety::WATER_LITERS_PER_KG);
    recommendations.push(format!(
        "Drink at least {:.1} L of water per day, more on training days.",
        water_liters
    ));

    let minimum = match metrics.gender {
        Gender::Male => safety::MIN_CALORIES_MALE,
        Gender::Female | Gender::Other => safety::MIN_CALORIES_FEMALE,
    };
    if calories.target_calories < minimum {
        recommendations.push(format!(
            "Your target of {:.0} kcal is below the commonly advised minimum of {:.0} kcal. Consider a smaller deficit or professional guidance.",
            calories.target_calories, minimum
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(gender: Gender) -> PersonalMetrics {
        PersonalMetrics {
            height: 175.0,
            weight: 70.0,
            age: 30,
            gender,
            activity_level: ActivityLevel::Moderate,
            fitness_goals: vec![],
        }
    }

    #[test]
    fn test_mifflin_st_jeor_male() {
        let calc = NutritionCalculator::default();
        // 700 + 1093.75 - 150 + 5 = 1648.75
        assert_eq!(calc.calculate_bmr(&metrics(Gender::Male)).unwrap(), 1649.0);
    }

    #[test]
    fn test_mifflin_st_jeor_female_and_other() {
        let calc = NutritionCalculator::default();
        // 1643.75 - 161 = 1482.75
        assert_eq!(calc.calculate_bmr(&metrics(Gender::Female)).unwrap(), 1483.0);
        assert_eq!(calc.calculate_bmr(&metrics(Gender::Other)).unwrap(), 1483.0);
    }

    #[test]
    fn test_bmr_rejects_non_positive_inputs() {
        let calc = NutritionCalculator::default();

        let zero_weight = PersonalMetrics { weight: 0.0, ..metrics(Gender::Male) };
        assert_eq!(
            calc.calculate_bmr(&zero_weight),
            Err(CalculationError::NonPositiveInput { field: "weight", value: 0.0 })
        );

        let zero_age = PersonalMetrics { age: 0, ..metrics(Gender::Male) };
        assert!(calc.calculate_bmr(&zero_age).is_err());
    }

    #[test]
    fn test_tdee_multipliers() {
        let calc = NutritionCalculator::default();
        assert_eq!(calc.calculate_tdee(1649.0, ActivityLevel::Moderate), 2556.0);
        assert_eq!(calc.calculate_tdee(1000.0, ActivityLevel::Sedentary), 1200.0);
        assert_eq!(calc.calculate_tdee(1000.0, ActivityLevel::VeryActive), 1900.0);
    }

    #[test]
    fn test_target_calories_maintenance() {
        let calc = NutritionCalculator::default();
        let target = calc.calculate_target_calories(2000.0, NutritionGoal::Maintenance);
        assert_eq!(target, GoalTarget { target_calories: 2000.0, adjustment: 0.0 });
    }

    #[test]
    fn test_target_calories_offsets() {
        let calc = NutritionCalculator::default();
        assert_eq!(calc.calculate_target_calories(2000.0, NutritionGoal::WeightLoss).target_calories, 1500.0);
        assert_eq!(calc.calculate_target_calories(2000.0, NutritionGoal::MuscleGain).target_calories, 2300.0);
        assert_eq!(calc.calculate_target_calories(2000.0, NutritionGoal::Endurance).target_calories, 2400.0);
    }

    #[test]
    fn test_macronutrients_weight_loss() {
        let calc = NutritionCalculator::default();
        let macros = calc.calculate_macronutrients(2000.0, NutritionGoal::WeightLoss);

        assert_eq!(macros.protein, 150.0); // 600 kcal / 4
        assert_eq!(macros.carbohydrates, 200.0); // 800 kcal / 4
        assert_eq!(macros.fats, 67.0); // 600 kcal / 9 = 66.7
        assert_eq!(macros.fiber, 28.0);
    }

    #[test]
    fn test_bmi_and_category() {
        let bmi = calculate_bmi(170.0, 70.0).unwrap();
        assert_eq!(bmi, 24.2);
        assert_eq!(categorize_bmi(bmi), BmiCategory::Normal);
    }

    #[test]
    fn test_bmi_category_boundaries() {
        assert_eq!(categorize_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(categorize_bmi(18.5), BmiCategory::Normal);
        assert_eq!(categorize_bmi(24.999), BmiCategory::Normal);
        assert_eq!(categorize_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(categorize_bmi(29.99), BmiCategory::Overweight);
        assert_eq!(categorize_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_calculate_rejects_invalid_metrics() {
        let calc = NutritionCalculator::default();
        let bad = PersonalMetrics { height: 50.0, ..metrics(Gender::Male) };

        match calc.calculate(&bad, NutritionGoal::Maintenance) {
            Err(CalculationError::InvalidMetrics(errors)) => {
                assert_eq!(errors, vec!["Height must be between 100 and 250 cm".to_string()]);
            }
            other => panic!("expected InvalidMetrics, got {:?}", other),
        }
    }

    #[test]
    fn test_low_calorie_warning() {
        let calc = NutritionCalculator::default();
        let small = PersonalMetrics {
            height: 150.0,
            weight: 45.0,
            age: 60,
            gender: Gender::Female,
            activity_level: ActivityLevel::Sedentary,
            fitness_goals: vec![],
        };

        let result = calc.calculate(&small, NutritionGoal::WeightLoss).unwrap();
        // BMR 450 + 937.5 - 300 - 161 = 926.5 -> 927; TDEE 1112; target 612
        assert_eq!(result.calorie_requirements.target_calories, 612.0);
        assert!(result.recommendations.iter().any(|r| r.contains("below the commonly advised minimum")));
    }
}
