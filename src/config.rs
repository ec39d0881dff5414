// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration management for the nutrition engine services

pub mod nutrition_config;

use crate::constants::env_config;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

pub use nutrition_config::NutritionConfig;

/// Settings for the HTTP server and the profile store
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    pub http_port: u16,
    pub database_url: String,
    /// Remote diet-plan backend; plans are generated locally when unset
    pub diet_backend_url: Option<String>,
    pub diet_backend_timeout_secs: u64,
    /// Path to a `NutritionConfig` TOML file
    pub nutrition_config_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8081,
            database_url: "sqlite:./data/profiles.db".to_string(),
            diet_backend_url: None,
            diet_backend_timeout_secs: 10,
            nutrition_config_path: None,
        }
    }
}

impl ServerConfig {
    pub fn load(path: Option<String>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| {
            dirs::config_dir()
                .map(|p| p.join("nutrition-engine/config.toml"))
                .unwrap_or_else(|| "config.toml".into())
                .to_string_lossy()
                .to_string()
        });

        let config = if Path::new(&config_path).exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", config_path))?
        } else {
            dotenv::dotenv().ok();
            Self::from_env()
        };

        config.validate()?;
        Ok(config)
    }

    /// Build the configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            http_port: env_config::http_port(),
            database_url: env_config::database_url(),
            diet_backend_url: env_config::diet_backend_url(),
            diet_backend_timeout_secs: env_config::diet_backend_timeout_secs(),
            nutrition_config_path: env_config::nutrition_config_path(),
        }
    }

    /// Parsed backend URL, if one is configured
    pub fn diet_backend(&self) -> Result<Option<Url>> {
        self.diet_backend_url
            .as_deref()
            .map(|raw| Url::parse(raw).with_context(|| format!("Invalid diet backend URL: {}", raw)))
            .transpose()
    }

    pub fn validate(&self) -> Result<()> {
        self.diet_backend()?;
        if self.diet_backend_timeout_secs == 0 {
            anyhow::bail!("diet_backend_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let parent = Path::new(path).parent().context("Invalid config path")?;
        fs::create_dir_all(parent)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let config_path_str = config_path.to_string_lossy().to_string();

        let config = ServerConfig {
            http_port: 9090,
            database_url: "sqlite::memory:".to_string(),
            diet_backend_url: Some("http://localhost:4000".to_string()),
            diet_backend_timeout_secs: 5,
            nutrition_config_path: None,
        };
        config.save(&config_path_str).unwrap();

        let loaded = ServerConfig::load(Some(config_path_str)).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.diet_backend().unwrap().unwrap().as_str(),
            "http://localhost:4000/"
        );
    }

    #[test]
    fn test_invalid_backend_url_rejected() {
        let config = ServerConfig {
            diet_backend_url: Some("not a url".to_string()),
            ..ServerConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid diet backend URL"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ServerConfig {
            diet_backend_timeout_secs: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "http_port = \"not a number\"").unwrap();

        let result = ServerConfig::load(Some(config_path.to_string_lossy().to_string()));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to parse config file"));
    }
}
