// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Logging configuration with structured output

use crate::constants::{env_config, service};
use anyhow::Result;
use serde_json::json;
use std::env;
use std::io;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread information
    pub include_thread: bool,
    /// Include span information for tracing
    pub include_spans: bool,
    pub service_name: String,
    pub service_version: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// JSON format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for CLI tools
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_location: false,
            include_thread: false,
            include_spans: false,
            service_name: service::SERVICE_NAME.to_string(),
            service_version: service::SERVICE_VERSION.to_string(),
            environment: "development".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        let level = env_config::log_level();

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Production gets location, thread and span detail
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_thread: is_production || env::var("LOG_INCLUDE_THREAD").is_ok(),
            include_spans: is_production || env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| service::SERVICE_NAME.to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| service::SERVICE_VERSION.to_string()),
            environment,
        }
    }

    /// Configuration for command-line tools: compact output, `verbose`
    /// lowers the level to debug
    pub fn for_cli(verbose: bool) -> Self {
        Self {
            level: if verbose { "debug" } else { "info" }.to_string(),
            format: LogFormat::Compact,
            ..Self::default()
        }
    }

    /// Initialize the global tracing subscriber
    pub fn init(&self) -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(env_filter);

        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => {
                let json_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread)
                    .with_thread_names(self.include_thread)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events)
                    .json();

                registry.with(json_layer).try_init()?;
            }
            LogFormat::Pretty => {
                let pretty_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread)
                    .with_thread_names(self.include_thread)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events);

                registry.with(pretty_layer).try_init()?;
            }
            LogFormat::Compact => {
                let compact_layer = fmt::layer()
                    .compact()
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_target(false)
                    .with_writer(io::stderr)
                    .with_span_events(FmtSpan::NONE);

                registry.with(compact_layer).try_init()?;
            }
        }

        self.log_startup_info();

        Ok(())
    }

    /// Log structured startup information
    fn log_startup_info(&self) {
        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "Nutrition engine starting up"
        );

        let config_summary = json!({
            "service": {
                "name": self.service_name,
                "version": self.service_version,
                "environment": self.environment
            },
            "logging": {
                "level": self.level,
                "format": format!("{:?}", self.format),
                "features": {
                    "location": self.include_location,
                    "thread": self.include_thread,
                    "spans": self.include_spans
                }
            }
        });

        info!("Configuration loaded: {}", config_summary);
    }
}

/// Initialize logging from environment
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Application-specific logging utilities
pub struct AppLogger;

impl AppLogger {
    /// Log a calculation request
    pub fn log_calculation(kind: &str, goal: &str, success: bool, duration_us: u64) {
        info!(
            calc.kind = %kind,
            calc.goal = %goal,
            calc.success = %success,
            calc.duration_us = %duration_us,
            "Nutrition calculation"
        );
    }

    /// Log the outcome of one profile migration
    pub fn log_migration(profile_id: &str, success: bool, warnings: usize, errors: usize) {
        if success && errors == 0 {
            info!(
                profile.id = %profile_id,
                migration.success = %success,
                migration.warnings = %warnings,
                migration.errors = %errors,
                "Profile migrated"
            );
        } else {
            warn!(
                profile.id = %profile_id,
                migration.success = %success,
                migration.warnings = %warnings,
                migration.errors = %errors,
                "Profile migrated with problems"
            );
        }
    }

    /// Log API requests
    pub fn log_api_request(method: &str, path: &str, status: u16, duration_ms: u64) {
        info!(
            http.method = %method,
            http.path = %path,
            http.status = %status,
            http.duration_ms = %duration_ms,
            "HTTP request"
        );
    }

    /// Log profile store operations
    pub fn log_store_operation(operation: &str, table: &str, rows: usize, success: bool) {
        info!(
            db.operation = %operation,
            db.table = %table,
            db.rows = %rows,
            db.success = %success,
            "Store operation"
        );
    }

    /// Log a diet-plan backend fallback
    pub fn log_backend_fallback(backend: &str, reason: &str) {
        warn!(
            backend.url = %backend,
            fallback.reason = %reason,
            "Diet plan backend unavailable, generating plan locally"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_logging_config_from_env() {
        env::set_var("LOG_FORMAT", "json");
        env::set_var("ENVIRONMENT", "production");
        env::set_var("SERVICE_NAME", "test-service");

        let config = LoggingConfig::from_env();

        assert!(matches!(config.format, LogFormat::Json));
        assert_eq!(config.environment, "production");
        assert_eq!(config.service_name, "test-service");
        assert!(config.include_location);

        env::remove_var("LOG_FORMAT");
        env::remove_var("ENVIRONMENT");
        env::remove_var("SERVICE_NAME");
    }

    #[test]
    fn test_default_logging_config() {
        let config = LoggingConfig::default();

        assert_eq!(config.level, "info");
        assert!(matches!(config.format, LogFormat::Pretty));
        assert_eq!(config.environment, "development");
        assert_eq!(config.service_name, "nutrition-engine");
        assert!(!config.include_location);
    }

    #[test]
    fn test_cli_logging_config() {
        let verbose = LoggingConfig::for_cli(true);
        assert_eq!(verbose.level, "debug");
        assert_eq!(verbose.format, LogFormat::Compact);

        let quiet = LoggingConfig::for_cli(false);
        assert_eq!(quiet.level, "info");
    }
}
