//! # Structured Logging Module
//!
//! Environment-aware console logging using the tracing ecosystem. Logs go to
//! stdout so container runtimes can collect them.
//!
//! - Console-only output, TTY-aware ANSI colors
//! - `RUST_LOG` wins; otherwise the level follows the deployment environment
//! - Optional JSON formatting for log shippers
//! - Domain helpers that keep field names consistent across call sites

use chrono::Utc;
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{ConfigManager, LoggingConfig};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific defaults
pub fn init_structured_logging() {
    init_logging(&LoggingConfig::default());
}

/// Initialize logging from loaded configuration
///
/// Only the first call has any effect. If another global subscriber is already
/// installed (a host process or test harness), it is left in place.
pub fn init_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let filter = build_filter(config, &environment);
        let use_ansi = IsTerminal::is_terminal(&std::io::stdout());

        let console_layer = if config.json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(use_ansi)
                .with_filter(filter)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(console_layer);

        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        } else {
            tracing::info!(
                environment = %environment,
                ansi_colors = use_ansi,
                json = config.json,
                "Structured logging initialized"
            );
        }
    });
}

fn build_filter(config: &LoggingConfig, environment: &str) -> EnvFilter {
    if let Some(level) = &config.level {
        if let Ok(filter) = EnvFilter::try_new(level) {
            return filter;
        }
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(get_log_level(environment)))
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" => "debug".to_string(),
        "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for setup step operations
pub fn log_step_operation(
    operation: &str,
    host_uuid: &str,
    step_id: u32,
    category: &str,
    execution_id: Option<&str>,
    status: &str,
) {
    tracing::info!(
        operation = %operation,
        host_uuid = %host_uuid,
        step_id = step_id,
        category = %category,
        execution_id = execution_id,
        status = %status,
        timestamp = %Utc::now().to_rfc3339(),
        "SETUP_STEP_OPERATION"
    );
}

/// Log structured data for device release decisions
pub fn log_release_operation(
    operation: &str,
    host_uuid: &str,
    team_id: Option<u32>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        host_uuid = %host_uuid,
        team_id = team_id,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "RELEASE_OPERATION"
    );
}
