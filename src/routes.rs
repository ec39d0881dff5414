// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! HTTP routes exposing the nutrition engine
//!
//! Every API response uses the [`ApiResponse`] envelope.

use crate::constants::error_codes;
use crate::diet_plan::{DietPlanError, DietPlanGenerationRequest, DietPlanService, PlanData};
use crate::intelligence::body_fat::{
    estimate_body_fat_percentage, get_body_fat_percentage, BodyFatAnalysis, BodyFatReading,
    BodyMeasurements,
};
use crate::intelligence::recommendation_engine::{
    default_catalog, ExerciseRecommendation, ExerciseRecommender,
};
use crate::intelligence::{
    Exercise, ExerciseRecommendationEngine, MetricsValidator, NutritionCalculator,
    RecommendationCriteria,
};
use crate::logging::AppLogger;
use crate::migration::{BatchMigrationResult, MigrationOptions, ProfileMigrator};
use crate::models::{
    ApiResponse, NutritionCalculationResult, NutritionGoal, PersonalMetrics, TrainingLevel,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use std::time::Instant;
use tracing::{error, info};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

/// Largest accepted request body
const MAX_BODY_BYTES: u64 = 512 * 1024;

const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalculateRequest {
    pub personal_metrics: PersonalMetrics,
    pub goal: NutritionGoal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BodyFatRequest {
    pub personal_metrics: PersonalMetrics,
    #[serde(default)]
    pub measurements: BodyMeasurements,
    #[serde(default)]
    pub training_level: Option<TrainingLevel>,
    /// Measured value that takes precedence over any estimate
    #[serde(default)]
    pub actual_percentage: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BodyFatResponse {
    pub reading: BodyFatReading,
    pub analysis: BodyFatAnalysis,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MigrateRequest {
    /// Raw legacy records; each is decoded on its own
    pub profiles: Vec<Value>,
    #[serde(default)]
    pub options: MigrationOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecommendRequest {
    pub criteria: RecommendationCriteria,
    /// Exercises to rank; the built-in catalog when absent
    #[serde(default)]
    pub exercises: Option<Vec<Exercise>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Rejection carrying an API error code
#[derive(Debug)]
pub struct ApiRejection {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiRejection {
    fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: error_codes::VALIDATION_ERROR,
            message: message.into(),
        }
    }
}

impl warp::reject::Reject for ApiRejection {}

impl From<DietPlanError> for ApiRejection {
    fn from(error: DietPlanError) -> Self {
        let status = match &error {
            DietPlanError::Validation(_) => StatusCode::BAD_REQUEST,
            DietPlanError::Backend { .. } => StatusCode::BAD_GATEWAY,
            DietPlanError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DietPlanError::Calculation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            code: error.code(),
            message: error.to_string(),
        }
    }
}

/// Handlers behind the HTTP API
#[derive(Clone)]
pub struct NutritionRoutes {
    calculator: NutritionCalculator,
    diet_plans: DietPlanService,
    migrator: ProfileMigrator,
    recommender: ExerciseRecommendationEngine,
}

impl NutritionRoutes {
    pub fn new(diet_plans: DietPlanService) -> Self {
        let calculator = diet_plans.calculator().clone();
        Self {
            migrator: ProfileMigrator::new(calculator.config().clone()),
            calculator,
            diet_plans,
            recommender: ExerciseRecommendationEngine::new(),
        }
    }

    pub async fn generate_diet_plan(
        &self,
        request: DietPlanGenerationRequest,
    ) -> Result<PlanData, ApiRejection> {
        info!(goal = %request.plan_type, days = request.duration_days, "Diet plan requested");
        let plan = self.diet_plans.generate_plan(&request).await.map_err(|e| {
            if e.code() == error_codes::INTERNAL_ERROR {
                error!("Diet plan generation failed: {}", e);
            }
            ApiRejection::from(e)
        })?;
        Ok(PlanData { plan })
    }

    pub fn calculate_nutrition(
        &self,
        request: CalculateRequest,
    ) -> Result<NutritionCalculationResult, ApiRejection> {
        let start = Instant::now();
        let result = self
            .calculator
            .calculate(&request.personal_metrics, request.goal)
            .map_err(|e| ApiRejection::validation(e.to_string()));

        AppLogger::log_calculation(
            "nutrition",
            request.goal.as_str(),
            result.is_ok(),
            start.elapsed().as_micros() as u64,
        );
        result
    }

    pub fn estimate_body_fat(&self, request: BodyFatRequest) -> Result<BodyFatResponse, ApiRejection> {
        let validation = MetricsValidator::new(self.calculator.config().validation)
            .validate(&request.personal_metrics);
        if !validation.is_valid {
            return Err(ApiRejection::validation(format!(
                "Invalid metrics: {}",
                validation.errors.join("; ")
            )));
        }

        let analysis = estimate_body_fat_percentage(
            &request.personal_metrics,
            &request.measurements,
            request.training_level,
        )
        .map_err(|e| ApiRejection::validation(e.to_string()))?;

        let reading = get_body_fat_percentage(
            request.actual_percentage,
            &request.personal_metrics,
            &request.measurements,
            request.training_level,
        )
        .map_err(|e| ApiRejection::validation(e.to_string()))?;

        Ok(BodyFatResponse { reading, analysis })
    }

    pub fn migrate_profiles(&self, request: MigrateRequest) -> BatchMigrationResult {
        let batch = self.migrator.batch_migrate_records(&request.profiles, &request.options);
        info!(
            total = batch.total,
            successful = batch.successful,
            failed = batch.failed,
            "Profiles migrated over HTTP"
        );
        batch
    }

    pub fn recommend_exercises(&self, request: RecommendRequest) -> Vec<ExerciseRecommendation> {
        let exercises = request.exercises.unwrap_or_else(default_catalog);
        let limit = request.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
        self.recommender.recommend(&exercises, &request.criteria, limit)
    }
}

/// API routes without health endpoints, recovery or logging
pub fn api_routes(
    routes: NutritionRoutes,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let diet_plan = warp::path!("api" / "diet" / "plans")
        .and(warp::post())
        .and(json_body::<DietPlanGenerationRequest>())
        .and(with_routes(routes.clone()))
        .and_then(diet_plan_handler);

    let calculate = warp::path!("api" / "nutrition" / "calculate")
        .and(warp::post())
        .and(json_body::<CalculateRequest>())
        .and(with_routes(routes.clone()))
        .and_then(calculate_handler);

    let body_fat = warp::path!("api" / "body-fat" / "estimate")
        .and(warp::post())
        .and(json_body::<BodyFatRequest>())
        .and(with_routes(routes.clone()))
        .and_then(body_fat_handler);

    let migrate = warp::path!("api" / "profiles" / "migrate")
        .and(warp::post())
        .and(json_body::<MigrateRequest>())
        .and(with_routes(routes.clone()))
        .map(|request: MigrateRequest, routes: NutritionRoutes| {
            warp::reply::json(&ApiResponse::ok(routes.migrate_profiles(request)))
        });

    let recommend = warp::path!("api" / "exercises" / "recommend")
        .and(warp::post())
        .and(json_body::<RecommendRequest>())
        .and(with_routes(routes))
        .map(|request: RecommendRequest, routes: NutritionRoutes| {
            warp::reply::json(&ApiResponse::ok(routes.recommend_exercises(request)))
        });

    diet_plan.or(calculate).or(body_fat).or(migrate).or(recommend)
}

/// Full server filter: API, health endpoints, CORS, error envelope and
/// request logging
pub fn server_routes<H>(
    routes: NutritionRoutes,
    health: H,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone
where
    H: Filter<Error = Rejection> + Clone + Send + Sync + 'static,
    H::Extract: Reply,
{
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "OPTIONS"]);

    let log = warp::log::custom(|info| {
        AppLogger::log_api_request(
            info.method().as_str(),
            info.path(),
            info.status().as_u16(),
            info.elapsed().as_millis() as u64,
        );
    });

    api_routes(routes)
        .or(health)
        .recover(handle_rejection)
        .with(cors)
        .with(log)
}

fn with_routes(
    routes: NutritionRoutes,
) -> impl Filter<Extract = (NutritionRoutes,), Error = Infallible> + Clone {
    warp::any().map(move || routes.clone())
}

fn json_body<T: serde::de::DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

async fn diet_plan_handler(
    request: DietPlanGenerationRequest,
    routes: NutritionRoutes,
) -> Result<impl Reply, Rejection> {
    let data = routes
        .generate_diet_plan(request)
        .await
        .map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(data)))
}

async fn calculate_handler(
    request: CalculateRequest,
    routes: NutritionRoutes,
) -> Result<impl Reply, Rejection> {
    let result = routes
        .calculate_nutrition(request)
        .map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(result)))
}

async fn body_fat_handler(
    request: BodyFatRequest,
    routes: NutritionRoutes,
) -> Result<impl Reply, Rejection> {
    let response = routes
        .estimate_body_fat(request)
        .map_err(warp::reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

/// Turn rejections into the error envelope
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, code, message) = if let Some(api_error) = err.find::<ApiRejection>() {
        (api_error.status, api_error.code, api_error.message.clone())
    } else if let Some(body_error) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            format!("Invalid request body: {}", body_error),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            error_codes::VALIDATION_ERROR,
            "Request body too large".to_string(),
        )
    } else if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "The requested endpoint was not found".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            "Method not allowed".to_string(),
        )
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            "Something went wrong".to_string(),
        )
    };

    let body = ApiResponse::<()>::err(message, code);
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
