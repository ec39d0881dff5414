// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Profile Migration
//!
//! Converts [`LegacyUserProfile`] records into [`UserProfileExtended`].
//!
//! Migration never returns `Err`. Problems are collected on the
//! [`MigrationResult`]:
//!
//! - `warnings`: a value was missing and a default or placeholder was
//!   substituted
//! - `errors`: the migrated profile failed validation
//!
//! `success` means a profile object was produced. `is_fully_valid` means it
//! also passed validation. In strict mode a validation failure turns
//! `success` off and no profile is returned.

use crate::config::NutritionConfig;
use crate::intelligence::MetricsValidator;
use crate::models::{
    parse_loose_enum, ActivityLevel, BudgetLevel, CookingTime, DietType, Gender,
    LegacyPreferences, LegacyUserProfile, PrimaryGoal, SubscriptionTier, TrainingLevel,
    UserProfileExtended, REQUIRED_PROFILE_FIELDS,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Number of entries kept in the batch frequency tables
const TOP_ENTRIES: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MigrationOptions {
    /// Fail the migration when the migrated profile is invalid
    pub strict: bool,
    /// Record validation errors on the result
    pub validate: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            strict: false,
            validate: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MigrationResult {
    pub success: bool,
    pub is_fully_valid: bool,
    pub migrated_profile: Option<UserProfileExtended>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Required fields filled from the defaults table or a placeholder
    pub applied_defaults: Vec<String>,
    /// `(17 - defaulted fields) / 17`, as a percentage
    pub completion_percentage: f64,
}

impl MigrationResult {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            is_fully_valid: false,
            migrated_profile: None,
            errors: vec![error.into()],
            warnings: Vec::new(),
            applied_defaults: Vec::new(),
            completion_percentage: 0.0,
        }
    }
}

/// A value and how many profiles reported it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchMigrationResult {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub fully_valid: usize,
    /// One result per input profile, in input order
    pub results: Vec<MigrationResult>,
    pub common_errors: Vec<FrequencyEntry>,
    pub common_defaults: Vec<FrequencyEntry>,
    pub average_completion: f64,
}

/// Copy of the legacy profiles taken before a migration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MigrationSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub reason: String,
    pub profiles: Vec<LegacyUserProfile>,
}

/// Ordered keyword rules; the first rule with a keyword found in any goal
/// wins
const PRIMARY_GOAL_RULES: &[(PrimaryGoal, &[&str])] = &[
    (PrimaryGoal::FatLoss, &["lose", "fat"]),
    (PrimaryGoal::MuscleGain, &["muscle", "gain", "bulk"]),
    (PrimaryGoal::Endurance, &["endurance", "cardio", "stamina"]),
    (PrimaryGoal::Recomposition, &["recomp", "tone"]),
];

const ADVANCED_KEYWORDS: &[&str] = &["advanced", "competitive"];

/// Map free-text goals to a primary goal; `None` when no rule matches
pub fn map_primary_goal(goals: &[String]) -> Option<PrimaryGoal> {
    let lowered: Vec<String> = goals.iter().map(|g| g.to_lowercase()).collect();
    PRIMARY_GOAL_RULES
        .iter()
        .find(|(_, keywords)| {
            lowered
                .iter()
                .any(|goal| keywords.iter().any(|k| goal.contains(k)))
        })
        .map(|(goal, _)| *goal)
}

pub fn infer_training_level(activity_level: ActivityLevel, goals: &[String]) -> TrainingLevel {
    let advanced = goals.iter().any(|goal| {
        let goal = goal.to_lowercase();
        ADVANCED_KEYWORDS.iter().any(|k| goal.contains(k))
    });

    match activity_level {
        _ if advanced => TrainingLevel::Advanced,
        ActivityLevel::VeryActive => TrainingLevel::Intermediate,
        ActivityLevel::Active if !goals.is_empty() => TrainingLevel::Intermediate,
        _ => TrainingLevel::Beginner,
    }
}

pub fn infer_workout_days(activity_level: ActivityLevel) -> u8 {
    match activity_level {
        ActivityLevel::VeryActive => 5,
        ActivityLevel::Active => 4,
        ActivityLevel::Moderate => 3,
        ActivityLevel::Light | ActivityLevel::Sedentary => 2,
    }
}

/// Migrates legacy profiles using a defaults table and validation ranges
#[derive(Debug, Clone, Default)]
pub struct ProfileMigrator {
    config: NutritionConfig,
}

impl ProfileMigrator {
    pub fn new(config: NutritionConfig) -> Self {
        Self { config }
    }

    pub fn migrate(&self, legacy: &LegacyUserProfile, options: &MigrationOptions) -> MigrationResult {
        let Some(metrics) = &legacy.personal_metrics else {
            warn!(profile.id = ?legacy.id, "Legacy profile has no personal metrics");
            return MigrationResult::failed("Legacy profile has no personal metrics");
        };

        let defaults = &self.config.migration_defaults;
        let mut tracker = DefaultTracker::default();

        let user_id = match legacy.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let generated = Uuid::new_v4().to_string();
                tracker
                    .warnings
                    .push(format!("Missing profile id; generated {}", generated));
                generated
            }
        };

        let height = tracker.placeholder("height", metrics.height.filter(|h| *h > 0.0), 0.0);
        let weight = tracker.placeholder("weight", metrics.weight.filter(|w| *w > 0.0), 0.0);
        let age = tracker.placeholder("age", metrics.age.filter(|a| *a > 0), 0);

        let gender = metrics.gender.as_deref().and_then(parse_loose_enum::<Gender>);
        if gender.is_none() {
            tracker
                .warnings
                .push("Missing or unrecognized gender; the user must provide it".to_string());
        }

        let activity_level = tracker.default_value(
            "activity_level",
            metrics.activity_level.as_deref().and_then(ActivityLevel::parse_loose),
            defaults.activity_level,
        );

        let goals = metrics.fitness_goals.clone();
        let primary_goal = tracker.default_value(
            "primary_goal",
            map_primary_goal(&goals),
            PrimaryGoal::FatLoss,
        );
        let training_level = infer_training_level(activity_level, &goals);

        let empty = LegacyPreferences::default();
        let prefs = legacy.preferences.as_ref().unwrap_or(&empty);
        let workout_days = prefs
            .workout_days_per_week
            .unwrap_or_else(|| infer_workout_days(activity_level));

        let profile = UserProfileExtended {
            user_id,
            height: Some(height),
            weight: Some(weight),
            age: Some(age),
            gender,
            activity_level: Some(activity_level),
            fitness_goals: Some(goals),
            primary_goal: Some(primary_goal),
            diet_type: Some(tracker.default_value(
                "diet_type",
                prefs.diet_type.as_deref().and_then(parse_loose_enum::<DietType>),
                defaults.diet_type,
            )),
            meals_per_day: Some(tracker.default_value(
                "meals_per_day",
                prefs.meals_per_day,
                defaults.meals_per_day,
            )),
            snacks_per_day: Some(tracker.default_value(
                "snacks_per_day",
                prefs.snacks_per_day,
                defaults.snacks_per_day,
            )),
            cooking_time: Some(tracker.default_value(
                "cooking_time",
                prefs.cooking_time.as_deref().and_then(parse_loose_enum::<CookingTime>),
                defaults.cooking_time,
            )),
            cuisine_preference: Some(tracker.default_value(
                "cuisine_preference",
                prefs
                    .cuisine_preference
                    .clone()
                    .filter(|c| !c.trim().is_empty()),
                defaults.cuisine_preference.clone(),
            )),
            budget_level: Some(tracker.default_value(
                "budget_level",
                prefs.budget_level.as_deref().and_then(parse_loose_enum::<BudgetLevel>),
                defaults.budget_level,
            )),
            training_level: Some(training_level),
            workout_days_per_week: Some(workout_days),
            subscription_tier: Some(tracker.default_value(
                "subscription_tier",
                legacy
                    .subscription_tier
                    .as_deref()
                    .and_then(parse_loose_enum::<SubscriptionTier>),
                defaults.subscription_tier,
            )),
            plan_duration_weeks: Some(tracker.default_value(
                "plan_duration_weeks",
                prefs.plan_duration_weeks,
                defaults.plan_duration_weeks,
            )),
            body_fat_percentage: None,
            dietary_restrictions: Vec::new(),
        };

        let validation =
            MetricsValidator::new(self.config.validation).validate_profile(&profile);
        let errors = if options.validate {
            validation.errors.clone()
        } else {
            Vec::new()
        };
        let is_fully_valid = validation.is_valid;

        let defaulted = tracker.applied_defaults.len();
        let total = REQUIRED_PROFILE_FIELDS.len();
        let completion_percentage =
            (total.saturating_sub(defaulted) as f64 / total as f64 * 100.0).round();

        let aborted = options.strict && options.validate && !is_fully_valid;
        debug!(
            profile.id = %profile.user_id,
            defaults = defaulted,
            warnings = tracker.warnings.len(),
            errors = errors.len(),
            aborted = aborted,
            "Legacy profile migrated"
        );

        MigrationResult {
            success: !aborted,
            is_fully_valid,
            migrated_profile: if aborted { None } else { Some(profile) },
            errors,
            warnings: tracker.warnings,
            applied_defaults: tracker.applied_defaults,
            completion_percentage,
        }
    }

    /// Migrate each profile in input order and summarize the outcomes
    pub fn batch_migrate(
        &self,
        profiles: &[LegacyUserProfile],
        options: &MigrationOptions,
    ) -> BatchMigrationResult {
        let results: Vec<MigrationResult> =
            profiles.iter().map(|p| self.migrate(p, options)).collect();
        summarize(results)
    }

    /// Migrate raw JSON records; a record that does not decode as a legacy
    /// profile fails on its own without affecting the rest of the batch
    pub fn batch_migrate_records(
        &self,
        records: &[Value],
        options: &MigrationOptions,
    ) -> BatchMigrationResult {
        let results: Vec<MigrationResult> = decode_legacy_profiles(records)
            .into_iter()
            .map(|decoded| match decoded {
                Ok(profile) => self.migrate(&profile, options),
                Err(error) => MigrationResult::failed(error),
            })
            .collect();
        summarize(results)
    }
}

/// Decode each record independently, keeping input order
pub fn decode_legacy_profiles(records: &[Value]) -> Vec<Result<LegacyUserProfile, String>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            LegacyUserProfile::deserialize(record).map_err(|e| {
                warn!(index, error = %e, "Undecodable legacy profile");
                format!("Legacy profile could not be decoded: {}", e)
            })
        })
        .collect()
}

fn summarize(results: Vec<MigrationResult>) -> BatchMigrationResult {
    let successful = results.iter().filter(|r| r.success).count();
    let fully_valid = results.iter().filter(|r| r.is_fully_valid).count();
    let average_completion = if results.is_empty() {
        0.0
    } else {
        let sum: f64 = results.iter().map(|r| r.completion_percentage).sum();
        crate::intelligence::round1(sum / results.len() as f64)
    };

    BatchMigrationResult {
        total: results.len(),
        successful,
        failed: results.len() - successful,
        fully_valid,
        common_errors: top_entries(results.iter().flat_map(|r| r.errors.iter())),
        common_defaults: top_entries(results.iter().flat_map(|r| r.applied_defaults.iter())),
        average_completion,
        results,
    }
}

/// Migrate one profile with the default configuration
pub fn migrate_user_profile(
    legacy: &LegacyUserProfile,
    options: &MigrationOptions,
) -> MigrationResult {
    ProfileMigrator::default().migrate(legacy, options)
}

/// Migrate many profiles with the default configuration
pub fn batch_migrate_profiles(
    profiles: &[LegacyUserProfile],
    options: &MigrationOptions,
) -> BatchMigrationResult {
    ProfileMigrator::default().batch_migrate(profiles, options)
}

pub fn create_migration_snapshot(
    profiles: &[LegacyUserProfile],
    reason: impl Into<String>,
) -> MigrationSnapshot {
    MigrationSnapshot {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        reason: reason.into(),
        profiles: profiles.to_vec(),
    }
}

/// Copy of the profiles held by a snapshot; the snapshot stays untouched
pub fn restore_from_snapshot(snapshot: &MigrationSnapshot) -> Vec<LegacyUserProfile> {
    snapshot.profiles.clone()
}

#[derive(Default)]
struct DefaultTracker {
    warnings: Vec<String>,
    applied_defaults: Vec<String>,
}

impl DefaultTracker {
    /// Use `default` when `value` is missing and record it
    fn default_value<T>(&mut self, field: &str, value: Option<T>, default: T) -> T {
        match value {
            Some(value) => value,
            None => {
                self.applied_defaults.push(field.to_string());
                default
            }
        }
    }

    /// Like `default_value`, but the substitute stands for missing user
    /// input, so it also warns
    fn placeholder<T>(&mut self, field: &str, value: Option<T>, placeholder: T) -> T {
        if value.is_none() {
            self.warnings
                .push(format!("Missing {}; the user must provide it", field));
        }
        self.default_value(field, value, placeholder)
    }
}

fn top_entries<'a>(values: impl Iterator<Item = &'a String>) -> Vec<FrequencyEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }

    let mut entries: Vec<FrequencyEntry> = counts
        .into_iter()
        .map(|(value, count)| FrequencyEntry {
            value: value.to_string(),
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    entries.truncate(TOP_ENTRIES);
    entries
}
