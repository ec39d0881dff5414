// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Diet Plan Generation
//!
//! [`DietPlanService`] forwards plan requests to an optional remote backend
//! and builds plans locally when the backend is missing or unreachable.
//! Both paths derive their targets from the same [`NutritionCalculator`].

use crate::constants::error_codes;
use crate::intelligence::{CalculationError, MetricsValidator, NutritionCalculator};
use crate::logging::AppLogger;
use crate::models::{
    ApiResponse, DietType, MacronutrientBreakdown, NutritionCalculationResult, NutritionGoal,
    PersonalMetrics,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Longest plan a request may ask for
pub const MAX_PLAN_DAYS: u32 = 365;

const GENERATE_PATH: &str = "api/diet/plans/generate";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DietPreferences {
    pub meals_per_day: u8,
    pub diet_type: Option<DietType>,
    pub cuisine: Option<String>,
}

impl Default for DietPreferences {
    fn default() -> Self {
        Self {
            meals_per_day: 3,
            diet_type: None,
            cuisine: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DietPlanGenerationRequest {
    pub personal_metrics: PersonalMetrics,
    pub plan_type: NutritionGoal,
    pub duration_days: u32,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub preferences: DietPreferences,
}

/// Calorie and macro targets for one meal slot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealTemplate {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fats: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Backend,
    Local,
    /// Built locally because the backend could not be reached
    LocalFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DietPlan {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub plan_type: NutritionGoal,
    pub duration_days: u32,
    pub nutrition: NutritionCalculationResult,
    pub meals: Vec<MealTemplate>,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub diet_type: Option<DietType>,
    pub source: PlanSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// `data` payload of the plan envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanData {
    pub plan: DietPlan,
}

#[derive(Debug, thiserror::Error)]
pub enum DietPlanError {
    #[error("Invalid diet plan request: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Diet plan backend rejected the request ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Diet plan backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error(transparent)]
    Calculation(#[from] CalculationError),
}

impl DietPlanError {
    /// Code reported in the API error envelope
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => error_codes::VALIDATION_ERROR,
            Self::Backend { .. } => error_codes::BACKEND_ERROR,
            Self::BackendUnavailable(_) => error_codes::BACKEND_UNAVAILABLE,
            Self::Calculation(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

/// Outcome of one backend call that did not produce a plan
enum BackendFailure {
    /// Connection error, timeout or 5xx; eligible for local fallback
    Unavailable(String),
    Rejected(DietPlanError),
}

/// Diet plan generator with optional remote backend
#[derive(Debug, Clone)]
pub struct DietPlanService {
    client: Client,
    backend: Option<Url>,
    calculator: NutritionCalculator,
    fallback_enabled: bool,
}

impl DietPlanService {
    /// Service that always builds plans locally
    pub fn new(calculator: NutritionCalculator) -> Self {
        Self {
            client: Client::new(),
            backend: None,
            calculator,
            fallback_enabled: true,
        }
    }

    /// Send requests to `backend` first, giving up after `timeout`
    pub fn with_backend(mut self, backend: Url, timeout: Duration) -> anyhow::Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build diet backend HTTP client")?;
        self.backend = Some(backend);
        Ok(self)
    }

    /// Report an unreachable backend as an error instead of falling back
    pub fn without_fallback(mut self) -> Self {
        self.fallback_enabled = false;
        self
    }

    pub fn calculator(&self) -> &NutritionCalculator {
        &self.calculator
    }

    /// Range and consistency checks for a request; empty when valid
    pub fn validate_request(&self, request: &DietPlanGenerationRequest) -> Vec<String> {
        let ranges = &self.calculator.config().validation;
        let mut errors = MetricsValidator::new(*ranges)
            .validate(&request.personal_metrics)
            .errors;

        if request.duration_days == 0 || request.duration_days > MAX_PLAN_DAYS {
            errors.push(format!(
                "Plan duration must be between 1 and {} days",
                MAX_PLAN_DAYS
            ));
        }
        if !ranges
            .meals_per_day
            .contains(f64::from(request.preferences.meals_per_day))
        {
            errors.push(format!(
                "Meals per day must be between {} and {}",
                ranges.meals_per_day.min, ranges.meals_per_day.max
            ));
        }

        errors
    }

    /// Validate the request, try the backend, fall back to a local plan
    pub async fn generate_plan(
        &self,
        request: &DietPlanGenerationRequest,
    ) -> Result<DietPlan, DietPlanError> {
        let errors = self.validate_request(request);
        if !errors.is_empty() {
            return Err(DietPlanError::Validation(errors));
        }

        let Some(backend) = &self.backend else {
            return self.generate_local_plan(request, PlanSource::Local, None);
        };

        match self.request_backend_plan(backend, request).await {
            Ok(plan) => {
                info!(plan.id = %plan.id, "Diet plan generated by backend");
                Ok(plan)
            }
            Err(BackendFailure::Rejected(error)) => Err(error),
            Err(BackendFailure::Unavailable(detail)) => {
                if !self.fallback_enabled {
                    return Err(DietPlanError::BackendUnavailable(detail));
                }
                AppLogger::log_backend_fallback(backend.as_str(), &detail);
                self.generate_local_plan(
                    request,
                    PlanSource::LocalFallback,
                    Some(error_codes::BACKEND_UNAVAILABLE.to_string()),
                )
            }
        }
    }

    /// Build a plan from the shared calculator
    ///
    /// Meal calories and macros sum exactly to the daily targets; the last
    /// meal absorbs the rounding remainder.
    pub fn generate_local_plan(
        &self,
        request: &DietPlanGenerationRequest,
        source: PlanSource,
        fallback_reason: Option<String>,
    ) -> Result<DietPlan, DietPlanError> {
        let nutrition = self
            .calculator
            .calculate(&request.personal_metrics, request.plan_type)?;

        // Targets are not clamped, so very small bodies on a deficit can go
        // negative; there is nothing to split into meals then
        let target = nutrition.calorie_requirements.target_calories;
        if target <= 0.0 {
            return Err(DietPlanError::Validation(vec![format!(
                "Target of {} kcal for {} leaves nothing to plan; choose a different goal",
                target, request.plan_type
            )]));
        }

        let meals = build_meals(
            nutrition.calorie_requirements.target_calories,
            &nutrition.macronutrients,
            request.preferences.meals_per_day,
        );

        debug!(
            goal = %request.plan_type,
            meals = meals.len(),
            target = nutrition.calorie_requirements.target_calories,
            "Diet plan generated locally"
        );

        Ok(DietPlan {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            plan_type: request.plan_type,
            duration_days: request.duration_days,
            nutrition,
            meals,
            restrictions: request.restrictions.clone(),
            diet_type: request.preferences.diet_type,
            source,
            fallback_reason,
        })
    }

    async fn request_backend_plan(
        &self,
        backend: &Url,
        request: &DietPlanGenerationRequest,
    ) -> Result<DietPlan, BackendFailure> {
        let url = format!("{}/{}", backend.as_str().trim_end_matches('/'), GENERATE_PATH);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendFailure::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(BackendFailure::Unavailable(format!(
                "backend returned {}",
                status
            )));
        }

        let body: ApiResponse<PlanData> = response.json().await.map_err(|e| {
            BackendFailure::Rejected(DietPlanError::Backend {
                status: status.as_u16(),
                message: format!("Unreadable backend response: {}", e),
            })
        })?;

        match body {
            ApiResponse {
                success: true,
                data: Some(data),
                ..
            } if status.is_success() => {
                let mut plan = data.plan;
                plan.source = PlanSource::Backend;
                Ok(plan)
            }
            ApiResponse { error, .. } => Err(BackendFailure::Rejected(DietPlanError::Backend {
                status: status.as_u16(),
                message: error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "Backend returned no plan".to_string()),
            })),
        }
    }
}

/// Split a whole-number total into `parts` whole numbers that sum to it
fn split_evenly(total: f64, parts: usize) -> Vec<f64> {
    let total = total.round();
    let share = (total / parts as f64).floor();
    let mut split = vec![share; parts];
    if let Some(last) = split.last_mut() {
        *last = total - share * (parts as f64 - 1.0);
    }
    split
}

fn meal_names(count: usize) -> Vec<String> {
    match count {
        1 => vec!["Main meal".to_string()],
        2 => vec!["Breakfast".to_string(), "Dinner".to_string()],
        _ => ["Breakfast", "Lunch", "Dinner"]
            .iter()
            .map(|name| name.to_string())
            .chain((4..=count).map(|n| format!("Meal {}", n)))
            .collect(),
    }
}

fn build_meals(
    target_calories: f64,
    macros: &MacronutrientBreakdown,
    meals_per_day: u8,
) -> Vec<MealTemplate> {
    let count = usize::from(meals_per_day.max(1));
    let calories = split_evenly(target_calories, count);
    let protein = split_evenly(macros.protein, count);
    let carbohydrates = split_evenly(macros.carbohydrates, count);
    let fats = split_evenly(macros.fats, count);

    meal_names(count)
        .into_iter()
        .enumerate()
        .map(|(i, name)| MealTemplate {
            name,
            calories: calories[i],
            protein: protein[i],
            carbohydrates: carbohydrates[i],
            fats: fats[i],
        })
        .collect()
}
