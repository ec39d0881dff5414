// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Health check endpoints and monitoring utilities

use crate::config::NutritionConfig;
use crate::constants::service;
use crate::database::Database;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{error, info};
use url::Url;

/// Overall health status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service: ServiceInfo,
    /// Individual component checks
    pub checks: Vec<ComponentHealth>,
    /// Unix timestamp (seconds)
    pub timestamp: u64,
    pub response_time_ms: u64,
}

/// Service information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    /// Environment (development, staging, production)
    pub environment: String,
    pub uptime_seconds: u64,
}

/// Individual component health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: String,
    pub duration_ms: u64,
    pub metadata: Option<serde_json::Value>,
}

/// Health checker for the nutrition service
pub struct HealthChecker {
    start_time: Instant,
    database: Database,
    nutrition_config: NutritionConfig,
    diet_backend: Option<Url>,
    client: Client,
    cached_status: RwLock<Option<(HealthResponse, Instant)>>,
    cache_ttl: Duration,
}

impl HealthChecker {
    pub fn new(database: Database, nutrition_config: NutritionConfig) -> Self {
        Self {
            start_time: Instant::now(),
            database,
            nutrition_config,
            diet_backend: None,
            client: Client::new(),
            cached_status: RwLock::new(None),
            cache_ttl: Duration::from_secs(30),
        }
    }

    /// Also probe the diet-plan backend in comprehensive checks
    pub fn with_diet_backend(mut self, backend: Url, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self.diet_backend = Some(backend);
        self
    }

    fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            name: service::SERVICE_NAME.to_string(),
            version: service::SERVICE_VERSION.to_string(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "unknown".to_string()),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Perform a basic health check (fast, suitable for load balancer probes)
    pub async fn basic_health(&self) -> HealthResponse {
        let start = Instant::now();

        let checks = vec![ComponentHealth {
            name: "service".to_string(),
            status: HealthStatus::Healthy,
            message: "Service is running".to_string(),
            duration_ms: 0,
            metadata: None,
        }];

        HealthResponse {
            status: HealthStatus::Healthy,
            service: self.service_info(),
            checks,
            timestamp: unix_now(),
            response_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Perform a comprehensive health check with all components
    pub async fn comprehensive_health(&self) -> HealthResponse {
        let start = Instant::now();

        {
            let cached = self.cached_status.read().await;
            if let Some((response, cached_at)) = cached.as_ref() {
                if cached_at.elapsed() < self.cache_ttl {
                    return response.clone();
                }
            }
        }

        info!("Performing comprehensive health check");

        let checks = vec![
            self.check_database().await,
            self.check_nutrition_config(),
            self.check_diet_backend().await,
        ];

        let overall_status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let response = HealthResponse {
            status: overall_status,
            service: self.service_info(),
            checks,
            timestamp: unix_now(),
            response_time_ms: start.elapsed().as_millis() as u64,
        };

        {
            let mut cached = self.cached_status.write().await;
            *cached = Some((response.clone(), Instant::now()));
        }

        response
    }

    async fn check_database(&self) -> ComponentHealth {
        let start = Instant::now();

        match self.database.ping().await {
            Ok(()) => ComponentHealth {
                name: "database".to_string(),
                status: HealthStatus::Healthy,
                message: "Database is accessible and responsive".to_string(),
                duration_ms: start.elapsed().as_millis() as u64,
                metadata: Some(serde_json::json!({ "type": "sqlite" })),
            },
            Err(e) => {
                error!("Database health check failed: {}", e);
                ComponentHealth {
                    name: "database".to_string(),
                    status: HealthStatus::Unhealthy,
                    message: format!("Database check failed: {}", e),
                    duration_ms: start.elapsed().as_millis() as u64,
                    metadata: None,
                }
            }
        }
    }

    fn check_nutrition_config(&self) -> ComponentHealth {
        let (status, message) = match self.nutrition_config.validate() {
            Ok(()) => (HealthStatus::Healthy, "Formula tables are consistent".to_string()),
            Err(e) => (HealthStatus::Unhealthy, format!("Invalid nutrition config: {}", e)),
        };

        ComponentHealth {
            name: "nutrition_config".to_string(),
            status,
            message,
            duration_ms: 0,
            metadata: None,
        }
    }

    /// An unreachable backend only degrades the service: plans fall back to
    /// local generation
    async fn check_diet_backend(&self) -> ComponentHealth {
        let start = Instant::now();

        let Some(backend) = &self.diet_backend else {
            return ComponentHealth {
                name: "diet_backend".to_string(),
                status: HealthStatus::Healthy,
                message: "No backend configured; plans are generated locally".to_string(),
                duration_ms: 0,
                metadata: None,
            };
        };

        let (status, message) = match self.client.get(backend.as_str()).send().await {
            Ok(response) if !response.status().is_server_error() => {
                (HealthStatus::Healthy, "Diet plan backend reachable".to_string())
            }
            Ok(response) => (
                HealthStatus::Degraded,
                format!("Diet plan backend returned {}", response.status()),
            ),
            Err(e) => (
                HealthStatus::Degraded,
                format!("Diet plan backend unreachable: {}", e),
            ),
        };

        ComponentHealth {
            name: "diet_backend".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
            metadata: Some(serde_json::json!({ "url": backend.as_str() })),
        }
    }

    /// Get readiness status (for Kubernetes readiness probes)
    pub async fn readiness(&self) -> HealthResponse {
        let mut response = self.basic_health().await;

        let db_check = self.check_database().await;
        response.checks.push(db_check.clone());

        response.status = if db_check.status == HealthStatus::Healthy {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        response
    }

    /// Get liveness status (for Kubernetes liveness probes)
    pub async fn liveness(&self) -> HealthResponse {
        self.basic_health().await
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Health check middleware for HTTP endpoints
pub mod middleware {
    use super::*;
    use std::sync::Arc;
    use warp::{Filter, Reply};

    /// Create health check routes
    pub fn routes(
        health_checker: HealthChecker,
    ) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
        let health_checker = Arc::new(health_checker);

        let health = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_health_checker(health_checker.clone()))
            .and_then(health_handler);

        let ready = warp::path("ready")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_health_checker(health_checker.clone()))
            .and_then(readiness_handler);

        let live = warp::path("live")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_health_checker(health_checker))
            .and_then(liveness_handler);

        health.or(ready).or(live)
    }

    fn with_health_checker(
        health_checker: Arc<HealthChecker>,
    ) -> impl Filter<Extract = (Arc<HealthChecker>,), Error = std::convert::Infallible> + Clone {
        warp::any().map(move || health_checker.clone())
    }

    async fn health_handler(
        health_checker: Arc<HealthChecker>,
    ) -> Result<impl Reply, warp::Rejection> {
        let response = health_checker.comprehensive_health().await;
        let status_code = match response.status {
            HealthStatus::Healthy | HealthStatus::Degraded => warp::http::StatusCode::OK,
            HealthStatus::Unhealthy => warp::http::StatusCode::SERVICE_UNAVAILABLE,
        };

        Ok(warp::reply::with_status(
            warp::reply::json(&response),
            status_code,
        ))
    }

    async fn readiness_handler(
        health_checker: Arc<HealthChecker>,
    ) -> Result<impl Reply, warp::Rejection> {
        let response = health_checker.readiness().await;
        let status_code = match response.status {
            HealthStatus::Healthy => warp::http::StatusCode::OK,
            _ => warp::http::StatusCode::SERVICE_UNAVAILABLE,
        };

        Ok(warp::reply::with_status(
            warp::reply::json(&response),
            status_code,
        ))
    }

    async fn liveness_handler(
        health_checker: Arc<HealthChecker>,
    ) -> Result<impl Reply, warp::Rejection> {
        let response = health_checker.liveness().await;
        Ok(warp::reply::json(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_checker() -> HealthChecker {
        let database = Database::new("sqlite::memory:").await.unwrap();
        HealthChecker::new(database, NutritionConfig::default())
    }

    #[tokio::test]
    async fn test_basic_health_check() {
        let health_checker = create_checker().await;
        let response = health_checker.basic_health().await;

        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.service.name, "nutrition-engine");
        assert!(!response.checks.is_empty());
    }

    #[tokio::test]
    async fn test_comprehensive_health_check() {
        let health_checker = create_checker().await;
        let response = health_checker.comprehensive_health().await;

        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.checks.len(), 3);
        assert!(response.checks.iter().any(|c| c.name == "database"));
        assert!(response.checks.iter().any(|c| c.name == "nutrition_config"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_degrades() {
        let database = Database::new("sqlite::memory:").await.unwrap();
        let backend = Url::parse("http://127.0.0.1:9").unwrap();
        let health_checker = HealthChecker::new(database, NutritionConfig::default())
            .with_diet_backend(backend, Duration::from_millis(500));

        let response = health_checker.comprehensive_health().await;
        assert_eq!(response.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_readiness_check() {
        let health_checker = create_checker().await;
        let response = health_checker.readiness().await;

        assert_eq!(response.status, HealthStatus::Healthy);
        assert!(response.checks.iter().any(|c| c.name == "database"));
    }
}
