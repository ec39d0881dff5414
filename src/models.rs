// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Core data structures shared by the calculation engine, the profile
//! migrator and the HTTP layer.
//!
//! ## Design Principles
//!
//! - **Transient**: every record is built by the caller, passed through pure
//!   functions and handed back. Nothing here owns storage.
//! - **Serializable**: all models round-trip through JSON with `snake_case`
//!   field names, except the legacy profile which keeps its original
//!   `camelCase` shape.
//! - **Type Safe**: enumerations replace the free-form strings of the
//!   legacy records wherever the value set is closed.
//!
//! ## Core Models
//!
//! - [`PersonalMetrics`]: physical metrics supplied by the user
//! - [`CalorieRequirements`] / [`MacronutrientBreakdown`]: derived targets
//! - [`NutritionCalculationResult`]: aggregate of one calculation call
//! - [`UserProfileExtended`]: structured profile used by plan generation
//! - [`LegacyUserProfile`]: loosely structured profile predating the above

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Biological sex used by the metabolic and body-fat formulas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Ordinal activity level, from least to most active
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Light exercise 1-3 days/week
    Light,
    /// Moderate exercise 3-5 days/week
    Moderate,
    /// Hard exercise 6-7 days/week
    Active,
    /// Hard daily exercise or a physical job
    VeryActive,
}

impl ActivityLevel {
    /// All levels in ascending order
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Active,
        ActivityLevel::VeryActive,
    ];

    /// Parse the spellings found in legacy records ("lightly_active",
    /// "Very Active", "extra-active", ...)
    pub fn parse_loose(raw: &str) -> Option<Self> {
        match normalize_key(raw).as_str() {
            "sedentary" => Some(Self::Sedentary),
            "light" | "lightly_active" => Some(Self::Light),
            "moderate" | "moderately_active" => Some(Self::Moderate),
            "active" => Some(Self::Active),
            "very_active" | "extra_active" => Some(Self::VeryActive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Active => "active",
            Self::VeryActive => "very_active",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Goal driving the caloric offset and the macronutrient split
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NutritionGoal {
    WeightLoss,
    MuscleGain,
    Maintenance,
    Endurance,
}

impl NutritionGoal {
    pub const ALL: [NutritionGoal; 4] = [
        NutritionGoal::WeightLoss,
        NutritionGoal::MuscleGain,
        NutritionGoal::Maintenance,
        NutritionGoal::Endurance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WeightLoss => "weight_loss",
            Self::MuscleGain => "muscle_gain",
            Self::Maintenance => "maintenance",
            Self::Endurance => "endurance",
        }
    }
}

impl fmt::Display for NutritionGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical metrics supplied by the user for one calculation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalMetrics {
    /// Height in centimeters
    pub height: f64,
    /// Weight in kilograms
    pub weight: f64,
    /// Age in years
    pub age: u32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    /// Free-text goals as typed by the user
    #[serde(default)]
    pub fitness_goals: Vec<String>,
}

/// Energy targets derived from [`PersonalMetrics`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CalorieRequirements {
    /// Basal Metabolic Rate (kcal/day)
    pub bmr: f64,
    /// Total Daily Energy Expenditure (kcal/day)
    pub tdee: f64,
    /// TDEE plus the goal offset (kcal/day)
    pub target_calories: f64,
    /// Offset applied to TDEE for the goal (kcal/day)
    pub goal_adjustment: f64,
}

/// Daily macronutrient targets in grams
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MacronutrientBreakdown {
    pub protein: f64,
    pub carbohydrates: f64,
    pub fats: f64,
    pub fiber: f64,
}

impl MacronutrientBreakdown {
    /// Calories reconstructed from the macro grams (fiber excluded)
    pub fn total_calories(&self) -> f64 {
        self.protein * 4.0 + self.carbohydrates * 4.0 + self.fats * 9.0
    }
}

/// WHO body-mass-index bands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Underweight => "underweight",
            Self::Normal => "normal",
            Self::Overweight => "overweight",
            Self::Obese => "obese",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate result of a full nutrition calculation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionCalculationResult {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub calorie_requirements: CalorieRequirements,
    pub macronutrients: MacronutrientBreakdown,
    pub recommendations: Vec<String>,
}

/// Primary training goal stored on the structured profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryGoal {
    FatLoss,
    MuscleGain,
    Endurance,
    Recomposition,
}

impl PrimaryGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FatLoss => "fat_loss",
            Self::MuscleGain => "muscle_gain",
            Self::Endurance => "endurance",
            Self::Recomposition => "recomposition",
        }
    }

    /// Nutrition goal used when generating calorie targets for this profile goal
    pub fn nutrition_goal(&self) -> NutritionGoal {
        match self {
            Self::FatLoss => NutritionGoal::WeightLoss,
            Self::MuscleGain => NutritionGoal::MuscleGain,
            Self::Endurance => NutritionGoal::Endurance,
            Self::Recomposition => NutritionGoal::Maintenance,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DietType {
    Omnivore,
    Vegetarian,
    Vegan,
    Pescatarian,
    Keto,
    Paleo,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CookingTime {
    /// Under 20 minutes per meal
    Quick,
    /// 20-45 minutes per meal
    Moderate,
    /// No constraint
    Extended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLevel {
    Low,
    Medium,
    High,
}

/// Training experience; also the difficulty ladder for exercises
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrainingLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl TrainingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for TrainingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Basic,
    Premium,
}

/// Names of the fields that must all be set for a profile to be complete
pub const REQUIRED_PROFILE_FIELDS: [&str; 17] = [
    "height",
    "weight",
    "age",
    "gender",
    "activity_level",
    "fitness_goals",
    "primary_goal",
    "diet_type",
    "meals_per_day",
    "snacks_per_day",
    "cooking_time",
    "cuisine_preference",
    "budget_level",
    "training_level",
    "workout_days_per_week",
    "subscription_tier",
    "plan_duration_weeks",
];

/// Structured profile: personal metrics plus diet, training and
/// subscription preferences
///
/// Every required field is optional at the type level so a partially
/// filled profile can be represented; [`crate::intelligence::validation::validate_user_profile`]
/// decides whether it is complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfileExtended {
    pub user_id: String,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub activity_level: Option<ActivityLevel>,
    pub fitness_goals: Option<Vec<String>>,
    pub primary_goal: Option<PrimaryGoal>,
    pub diet_type: Option<DietType>,
    pub meals_per_day: Option<u8>,
    pub snacks_per_day: Option<u8>,
    pub cooking_time: Option<CookingTime>,
    pub cuisine_preference: Option<String>,
    pub budget_level: Option<BudgetLevel>,
    pub training_level: Option<TrainingLevel>,
    pub workout_days_per_week: Option<u8>,
    pub subscription_tier: Option<SubscriptionTier>,
    pub plan_duration_weeks: Option<u8>,
    /// Measured body-fat percentage, when the user has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dietary_restrictions: Vec<String>,
}

impl UserProfileExtended {
    /// Whether the named required field holds a value
    pub fn has_field(&self, field: &str) -> bool {
        match field {
            "height" => self.height.is_some(),
            "weight" => self.weight.is_some(),
            "age" => self.age.is_some(),
            "gender" => self.gender.is_some(),
            "activity_level" => self.activity_level.is_some(),
            "fitness_goals" => self.fitness_goals.is_some(),
            "primary_goal" => self.primary_goal.is_some(),
            "diet_type" => self.diet_type.is_some(),
            "meals_per_day" => self.meals_per_day.is_some(),
            "snacks_per_day" => self.snacks_per_day.is_some(),
            "cooking_time" => self.cooking_time.is_some(),
            "cuisine_preference" => self.cuisine_preference.is_some(),
            "budget_level" => self.budget_level.is_some(),
            "training_level" => self.training_level.is_some(),
            "workout_days_per_week" => self.workout_days_per_week.is_some(),
            "subscription_tier" => self.subscription_tier.is_some(),
            "plan_duration_weeks" => self.plan_duration_weeks.is_some(),
            _ => false,
        }
    }

    /// Personal metrics view of the profile, if every metric is present
    pub fn personal_metrics(&self) -> Option<PersonalMetrics> {
        Some(PersonalMetrics {
            height: self.height?,
            weight: self.weight?,
            age: self.age?,
            gender: self.gender?,
            activity_level: self.activity_level?,
            fitness_goals: self.fitness_goals.clone().unwrap_or_default(),
        })
    }
}

/// Metrics block of a legacy profile; any field may be missing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPersonalMetrics {
    #[serde(default, deserialize_with = "loose_number::float")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "loose_number::float")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "loose_number::integer")]
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub activity_level: Option<String>,
    #[serde(default)]
    pub fitness_goals: Vec<String>,
}

/// Preference block of a legacy profile, stored as loose strings and numbers
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPreferences {
    pub diet_type: Option<String>,
    #[serde(default, deserialize_with = "loose_number::integer")]
    pub meals_per_day: Option<u8>,
    #[serde(default, deserialize_with = "loose_number::integer")]
    pub snacks_per_day: Option<u8>,
    pub cooking_time: Option<String>,
    pub cuisine_preference: Option<String>,
    pub budget_level: Option<String>,
    #[serde(default, deserialize_with = "loose_number::integer")]
    pub workout_days_per_week: Option<u8>,
    #[serde(default, deserialize_with = "loose_number::integer")]
    pub plan_duration_weeks: Option<u8>,
}

/// Profile record predating [`UserProfileExtended`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyUserProfile {
    pub id: Option<String>,
    pub email: Option<String>,
    pub personal_metrics: Option<LegacyPersonalMetrics>,
    pub preferences: Option<LegacyPreferences>,
    pub subscription_tier: Option<String>,
}

/// Numeric fields of legacy records arrive as numbers or numeric strings.
/// Anything that does not fit the field reads as missing, so the migrator
/// substitutes a default for it instead of rejecting the record.
mod loose_number {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_f64(value: Option<Value>) -> Option<f64> {
        let number = match value? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(to_f64(Option::<Value>::deserialize(deserializer)?))
    }

    /// Fractions round to the nearest whole number
    pub fn integer<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u64>,
    {
        Ok(to_f64(Option::<Value>::deserialize(deserializer)?)
            .filter(|n| *n >= 0.0 && *n <= u64::MAX as f64)
            .and_then(|n| T::try_from(n.round() as u64).ok()))
    }
}

/// Error body of a failed API call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiError {
    pub message: String,
    pub code: String,
}

/// HTTP envelope: `{success, data}` or `{success: false, error}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                message: message.into(),
                code: code.into(),
            }),
        }
    }
}

/// Lower-case a free-form enum spelling and join words with underscores
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['-', ' '], "_")
}

/// Parse a loose spelling into any `snake_case` serde enum
pub fn parse_loose_enum<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(normalize_key(raw))).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_level_parse_loose() {
        assert_eq!(ActivityLevel::parse_loose("Very Active"), Some(ActivityLevel::VeryActive));
        assert_eq!(ActivityLevel::parse_loose("lightly_active"), Some(ActivityLevel::Light));
        assert_eq!(ActivityLevel::parse_loose(" moderate "), Some(ActivityLevel::Moderate));
        assert_eq!(ActivityLevel::parse_loose("couch"), None);
    }

    #[test]
    fn test_activity_level_ordering() {
        for pair in ActivityLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_parse_loose_enum() {
        assert_eq!(parse_loose_enum::<DietType>("Vegan"), Some(DietType::Vegan));
        assert_eq!(parse_loose_enum::<BudgetLevel>("HIGH"), Some(BudgetLevel::High));
        assert_eq!(parse_loose_enum::<Gender>("female"), Some(Gender::Female));
        assert_eq!(parse_loose_enum::<CookingTime>("forever"), None);
    }

    #[test]
    fn test_metrics_serialization() {
        let metrics = PersonalMetrics {
            height: 175.0,
            weight: 70.0,
            age: 30,
            gender: Gender::Male,
            activity_level: ActivityLevel::VeryActive,
            fitness_goals: vec![],
        };

        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["activity_level"], "very_active");
        assert_eq!(json["gender"], "male");

        let parsed: PersonalMetrics = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, metrics);
    }

    #[test]
    fn test_legacy_profile_uses_camel_case() {
        let raw = serde_json::json!({
            "id": "legacy-1",
            "personalMetrics": {
                "height": 180.0,
                "activityLevel": "active",
                "fitnessGoals": ["build muscle"]
            }
        });

        let profile: LegacyUserProfile = serde_json::from_value(raw).unwrap();
        let metrics = profile.personal_metrics.unwrap();
        assert_eq!(metrics.height, Some(180.0));
        assert_eq!(metrics.activity_level.as_deref(), Some("active"));
        assert_eq!(metrics.fitness_goals, vec!["build muscle".to_string()]);
        assert!(metrics.weight.is_none());
    }

    #[test]
    fn test_api_response_envelope() {
        let ok = serde_json::to_value(ApiResponse::ok(42)).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "data": 42}));

        let err = serde_json::to_value(ApiResponse::<()>::err("bad input", "VALIDATION_ERROR")).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"]["code"], "VALIDATION_ERROR");
        assert!(err.get("data").is_none());
    }

    #[test]
    fn test_legacy_numbers_are_lenient() {
        let raw = serde_json::json!({
            "personalMetrics": {
                "height": "180",
                "weight": " 72.5 ",
                "age": 30.6
            },
            "preferences": {
                "mealsPerDay": 300,
                "snacksPerDay": "2",
                "workoutDaysPerWeek": -1,
                "planDurationWeeks": {"weeks": 8}
            }
        });

        let profile: LegacyUserProfile = serde_json::from_value(raw).unwrap();
        let metrics = profile.personal_metrics.unwrap();
        assert_eq!(metrics.height, Some(180.0));
        assert_eq!(metrics.weight, Some(72.5));
        assert_eq!(metrics.age, Some(31));

        let prefs = profile.preferences.unwrap();
        assert_eq!(prefs.meals_per_day, None);
        assert_eq!(prefs.snacks_per_day, Some(2));
        assert_eq!(prefs.workout_days_per_week, None);
        assert_eq!(prefs.plan_duration_weeks, None);
    }

    #[test]
    fn test_legacy_numbers_round_trip() {
        let profile = LegacyUserProfile {
            id: Some("legacy-2".to_string()),
            personal_metrics: Some(LegacyPersonalMetrics {
                height: Some(165.5),
                age: Some(44),
                ..Default::default()
            }),
            preferences: Some(LegacyPreferences {
                meals_per_day: Some(4),
                ..Default::default()
            }),
            ..Default::default()
        };

        let json = serde_json::to_string(&profile).unwrap();
        let parsed: LegacyUserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_api_response_decodes_error_without_payload_default() {
        #[derive(Debug, Deserialize)]
        struct Payload {
            #[allow(dead_code)]
            value: u32,
        }

        let body = r#"{"success": false, "error": {"message": "Unsupported diet", "code": "VALIDATION_ERROR"}}"#;
        let response: ApiResponse<Payload> = serde_json::from_str(body).unwrap();
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.unwrap().message, "Unsupported diet");
    }

    #[test]
    fn test_profile_personal_metrics_requires_all_fields() {
        let mut profile = UserProfileExtended {
            height: Some(170.0),
            weight: Some(65.0),
            age: Some(40),
            gender: Some(Gender::Female),
            ..Default::default()
        };
        assert!(profile.personal_metrics().is_none());

        profile.activity_level = Some(ActivityLevel::Light);
        let metrics = profile.personal_metrics().unwrap();
        assert_eq!(metrics.age, 40);
        assert!(metrics.fitness_goals.is_empty());
    }
}
