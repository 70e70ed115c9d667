//! Configuration loading and validation for the marketplace.
//!
//! Uses serde_yaml to load YAML configuration files with support for
//! environment variable overrides.

mod app;
mod catalog;
mod error;
mod storage;

pub use app::AppConfig;
pub use catalog::CatalogConfig;
pub use error::ConfigError;
pub use storage::StorageConfig;

use serde::Deserialize;
use std::{env, fs};

/// Root configuration structure for the marketplace.
///
/// Required sections: app. Optional sections: storage, catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application-level settings like name and environment.
    pub app: AppConfig,
    /// Order persistence (optional; defaults apply when absent).
    pub storage: Option<StorageConfig>,
    /// Demo catalog seeding (optional).
    pub catalog: Option<CatalogConfig>,
}

impl Config {
    /// Load configuration from a YAML file at the given path.
    ///
    /// First loads environment variables from `.env` (if present), then
    /// the YAML config. `DATABASE_PATH` overrides `storage.path`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let content = fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;

        config.load_overrides_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn load_overrides_from_env(&mut self) {
        if let Ok(path) = env::var("DATABASE_PATH") {
            if !path.is_empty() {
                let storage = self.storage.get_or_insert(StorageConfig {
                    path: None,
                    max_connections: 5,
                });
                storage.path = Some(path);
            }
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.is_empty() {
            return Err(ConfigError::Validation("app.name is required".into()));
        }

        if self.app.env.is_empty() {
            return Err(ConfigError::Validation("app.env is required".into()));
        }

        if let Some(ref storage) = self.storage {
            if storage.max_connections == 0 {
                return Err(ConfigError::Validation(
                    "storage.max_connections must be positive".into(),
                ));
            }
        }

        Ok(())
    }
}
