//! # Setup Experience Metrics
//!
//! OpenTelemetry counters for step sequencing and device release. Instruments are
//! created from the global meter provider under the configured service name, so
//! they are no-ops until the host process installs one.
//!
//! [`init_metrics`] applies [`TelemetryConfig`] once per process. With
//! `metrics_enabled = false` nothing is recorded. Before initialization the
//! defaults apply.
//!
//! ```rust
//! use opentelemetry::KeyValue;
//! use setup_experience::config::TelemetryConfig;
//! use setup_experience::metrics;
//!
//! metrics::init_metrics(&TelemetryConfig::default());
//! metrics::steps_started().add(1, &[KeyValue::new("category", "script")]);
//! ```

use opentelemetry::metrics::{Counter, Meter, MeterProvider as _};
use opentelemetry::{InstrumentationScope, KeyValue};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::config::TelemetryConfig;
use crate::models::StepCategory;

/// Global metrics state, fixed by the first initialization
static METRICS_STATE: OnceLock<MetricsState> = OnceLock::new();

#[derive(Debug)]
struct MetricsState {
    enabled: bool,
    meter: Meter,
}

impl MetricsState {
    fn from_config(config: &TelemetryConfig) -> Self {
        let scope = InstrumentationScope::builder(config.service_name.clone())
            .with_version(env!("CARGO_PKG_VERSION"))
            .build();

        Self {
            enabled: config.metrics_enabled,
            meter: opentelemetry::global::meter_provider().meter_with_scope(scope),
        }
    }
}

/// Apply telemetry configuration to the process-wide metrics state
///
/// Safe to call multiple times; only the first call takes effect. Returns `true`
/// when this call performed the initialization.
pub fn init_metrics(config: &TelemetryConfig) -> bool {
    let mut initialized = false;
    METRICS_STATE.get_or_init(|| {
        initialized = true;
        MetricsState::from_config(config)
    });

    if initialized {
        info!(
            service_name = %config.service_name,
            metrics_enabled = config.metrics_enabled,
            "Setup experience metrics initialized"
        );
    } else {
        debug!("Setup experience metrics already initialized, configuration ignored");
    }

    initialized
}

fn state() -> &'static MetricsState {
    METRICS_STATE.get_or_init(|| MetricsState::from_config(&TelemetryConfig::default()))
}

/// Whether counters are being recorded
pub fn metrics_enabled() -> bool {
    state().enabled
}

fn meter() -> &'static Meter {
    &state().meter
}

/// Steps moved to Running
///
/// Labels:
/// - category: software_installer, vpp_app, script
pub fn steps_started() -> Counter<u64> {
    meter()
        .u64_counter("setup_experience.steps.started")
        .with_description("Setup experience steps moved to running")
        .build()
}

/// Enqueue or persist failures while advancing steps
///
/// Labels:
/// - category: software_installer, vpp_app, script
pub fn step_enqueue_failures() -> Counter<u64> {
    meter()
        .u64_counter("setup_experience.steps.enqueue_failures")
        .with_description("Setup experience steps that failed to enqueue or persist")
        .build()
}

/// Release readiness checks performed
///
/// Labels:
/// - decision: released, force_released, manual_release_required, not_ready, unsupported_platform
pub fn release_checks() -> Counter<u64> {
    meter()
        .u64_counter("setup_experience.release.checks")
        .with_description("Release readiness checks performed")
        .build()
}

/// Device-configured commands issued
///
/// Labels:
/// - forced: true, false
pub fn devices_released() -> Counter<u64> {
    meter()
        .u64_counter("setup_experience.devices.released")
        .with_description("Devices released from awaiting configuration")
        .build()
}

pub(crate) fn record_step_started(category: StepCategory) {
    if metrics_enabled() {
        steps_started().add(1, &[KeyValue::new("category", category.as_str())]);
    }
}

pub(crate) fn record_enqueue_failure(category: StepCategory) {
    if metrics_enabled() {
        step_enqueue_failures().add(1, &[KeyValue::new("category", category.as_str())]);
    }
}

pub(crate) fn record_release_check(decision: &'static str) {
    if metrics_enabled() {
        release_checks().add(1, &[KeyValue::new("decision", decision)]);
    }
}

pub(crate) fn record_device_released(forced: bool) {
    if metrics_enabled() {
        devices_released().add(1, &[KeyValue::new("forced", forced)]);
    }
}
