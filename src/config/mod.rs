//! # Setup Experience Configuration
//!
//! Layered, environment-aware configuration for the setup experience service.
//!
//! ## Sources
//!
//! Later sources override earlier ones:
//!
//! 1. `setup-experience.toml` in the configuration directory
//! 2. `setup-experience.<environment>.toml` in the same directory
//! 3. Environment variables prefixed `SETUP_EXPERIENCE_`, using `__` between levels
//!    (`SETUP_EXPERIENCE_RELEASE__MANUAL_RELEASE_DEFAULT=true`)
//!
//! Both files are optional; every field has a default.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use setup_experience::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let threshold = manager.config().setup_experience.stuck_step_warning_seconds;
//! let manual = manager.config().release.manual_release_for(Some(3));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupExperienceConfig {
    pub setup_experience: SequencingConfig,
    pub release: ReleaseConfig,
    pub logging: LoggingConfig,
    pub telemetry: TelemetryConfig,
}

/// Knobs for the next-step engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencingConfig {
    /// Running steps older than this are reported at warn level. Zero disables the check.
    pub stuck_step_warning_seconds: u64,
}

impl Default for SequencingConfig {
    fn default() -> Self {
        Self {
            stuck_step_warning_seconds: 3600,
        }
    }
}

impl SequencingConfig {
    pub fn stuck_step_threshold(&self) -> Option<Duration> {
        match self.stuck_step_warning_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }
}

/// Whether devices wait for an operator to release them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Applies to hosts without a team and to teams without an override
    pub manual_release_default: bool,
    /// Per-team overrides keyed by team id
    pub team_overrides: HashMap<String, bool>,
}

impl ReleaseConfig {
    pub fn manual_release_for(&self, team_id: Option<u32>) -> bool {
        team_id
            .and_then(|id| self.team_overrides.get(&id.to_string()).copied())
            .unwrap_or(self.manual_release_default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; falls back to `RUST_LOG`, then the environment default
    pub level: Option<String>,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub metrics_enabled: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            service_name: "setup-experience".to_string(),
        }
    }
}

impl SetupExperienceConfig {
    /// Validate configuration values that serde cannot check on its own
    pub fn validate(&self) -> ConfigResult<()> {
        for key in self.release.team_overrides.keys() {
            if key.parse::<u32>().is_err() {
                return Err(ConfigurationError::invalid_value(
                    "release.team_overrides",
                    key.clone(),
                    "keys must be numeric team ids",
                ));
            }
        }

        if let Some(level) = &self.logging.level {
            if tracing_subscriber::EnvFilter::try_new(level).is_err() {
                return Err(ConfigurationError::invalid_value(
                    "logging.level",
                    level.clone(),
                    "not a valid tracing filter directive",
                ));
            }
        }

        if self.telemetry.metrics_enabled && self.telemetry.service_name.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "telemetry.service_name",
                self.telemetry.service_name.clone(),
                "service name is required when metrics are enabled",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SetupExperienceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.setup_experience.stuck_step_warning_seconds, 3600);
        assert!(!config.release.manual_release_default);
    }

    #[test]
    fn test_manual_release_resolution() {
        let mut release = ReleaseConfig {
            manual_release_default: true,
            ..Default::default()
        };
        release.team_overrides.insert("7".to_string(), false);

        assert!(release.manual_release_for(None));
        assert!(release.manual_release_for(Some(3)));
        assert!(!release.manual_release_for(Some(7)));
    }

    #[test]
    fn test_stuck_threshold_zero_disables() {
        let config = SequencingConfig {
            stuck_step_warning_seconds: 0,
        };
        assert!(config.stuck_step_threshold().is_none());
        assert_eq!(
            SequencingConfig::default().stuck_step_threshold(),
            Some(Duration::from_secs(3600))
        );
    }

    #[test]
    fn test_validation_rejects_non_numeric_team_key() {
        let mut config = SetupExperienceConfig::default();
        config
            .release
            .team_overrides
            .insert("engineering".to_string(), true);

        match config.validate() {
            Err(ConfigurationError::InvalidValue { field, value, .. }) => {
                assert_eq!(field, "release.team_overrides");
                assert_eq!(value, "engineering");
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_rejects_empty_service_name() {
        let mut config = SetupExperienceConfig::default();
        config.telemetry.service_name = "  ".to_string();
        assert!(config.validate().is_err());

        config.telemetry.metrics_enabled = false;
        assert!(config.validate().is_ok());
    }
}
