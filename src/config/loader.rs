//! Configuration Loader
//!
//! Environment-aware configuration loading on top of the `config` crate. Handles
//! environment detection, file layering and environment variable overrides.

use super::error::{ConfigResult, ConfigurationError};
use super::SetupExperienceConfig;
use config::{Config, Environment, File};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const BASE_FILE_STEM: &str = "setup-experience";
const ENV_PREFIX: &str = "SETUP_EXPERIENCE";

/// Loaded, validated configuration plus where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: SetupExperienceConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::build(config_dir, environment, None)
    }

    /// Load with an explicit set of environment variables instead of the process environment
    ///
    /// Keys use the same `SETUP_EXPERIENCE_` form as real variables. Useful in tests,
    /// where mutating the process environment races with other tests.
    pub fn load_with_overrides(
        config_dir: Option<PathBuf>,
        environment: &str,
        overrides: HashMap<String, String>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::build(config_dir, environment, Some(overrides))
    }

    fn build(
        config_dir: Option<PathBuf>,
        environment: &str,
        env_source: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let base_file = Self::base_config_path(&config_directory);
        let env_file = Self::environment_config_path(&config_directory, environment);

        let environment_source = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env_source);

        let config: SetupExperienceConfig = Config::builder()
            .add_source(File::from(base_file.as_path()).required(false))
            .add_source(File::from(env_file.as_path()).required(false))
            .add_source(environment_source)
            .build()
            .and_then(|merged| merged.try_deserialize())
            .map_err(|e| ConfigurationError::from_config_error(environment, e))?;

        config.validate()?;

        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&config)
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );

        info!(
            environment = %environment,
            config_directory = %config_directory.display(),
            base_file_present = base_file.exists(),
            environment_file_present = env_file.exists(),
            manual_release_default = config.release.manual_release_default,
            "Configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &SetupExperienceConfig {
        &self.config
    }

    /// JSON view of the loaded configuration for diagnostics
    pub fn debug_config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    pub fn base_config_path(config_directory: &Path) -> PathBuf {
        config_directory.join(format!("{BASE_FILE_STEM}.toml"))
    }

    pub fn environment_config_path(config_directory: &Path, environment: &str) -> PathBuf {
        config_directory.join(format!("{BASE_FILE_STEM}.{environment}.toml"))
    }

    /// Detect current environment from environment variables
    pub fn detect_environment() -> String {
        Self::resolve_environment(
            env::var("SETUP_EXPERIENCE_ENV").ok(),
            env::var("APP_ENV").ok(),
        )
    }

    /// Environment name from `SETUP_EXPERIENCE_ENV`, then `APP_ENV`, lowercased
    pub fn resolve_environment(setup_env: Option<String>, app_env: Option<String>) -> String {
        setup_env
            .or(app_env)
            .unwrap_or_else(|| "development".to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        env::var("SETUP_EXPERIENCE_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }
}
