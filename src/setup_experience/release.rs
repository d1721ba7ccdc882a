//! # Release Trigger
//!
//! Called once per device check-in. Loads the host's release status, releases the
//! device from "awaiting configuration" when it is ready (or when release is forced
//! and manual release is off) and then always advances the next-step engine so queued
//! work keeps flowing.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::error::{SetupError, SetupResult};
use crate::logging::log_release_operation;
use crate::metrics;
use crate::models::{ReleaseStatusPayload, SetupExperienceStep, SetupHost, StepCategory, StepResult};
use crate::setup_experience::engine::NextStepEngine;
use crate::setup_experience::readiness::{evaluate, ReleaseReadiness};
use crate::setup_experience::traits::{
    HostDirectory, MdmCommander, ReleaseSettings, ReleaseStatusSource, SetupStepStore,
};

/// What the release check decided for the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseDecision {
    /// Everything finished and the device-configured command was sent
    Released,
    /// Release was forced past incomplete items and the command was sent
    ForceReleased,
    /// Ready or forced, but an operator must release the device
    ManualReleaseRequired,
    NotReady,
    /// The platform has no awaiting-configuration state to release
    UnsupportedPlatform,
}

impl ReleaseDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Released => "released",
            Self::ForceReleased => "force_released",
            Self::ManualReleaseRequired => "manual_release_required",
            Self::NotReady => "not_ready",
            Self::UnsupportedPlatform => "unsupported_platform",
        }
    }

    /// Whether the device-configured command was issued
    pub fn is_released(&self) -> bool {
        matches!(self, Self::Released | Self::ForceReleased)
    }
}

impl fmt::Display for ReleaseDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReleaseCheckOutcome {
    pub decision: ReleaseDecision,
    /// Result of the engine advance that follows every check
    pub sequence_finished: bool,
}

pub struct ReleaseTrigger {
    hosts: Arc<dyn HostDirectory>,
    store: Arc<dyn SetupStepStore>,
    status_source: Arc<dyn ReleaseStatusSource>,
    settings: Arc<dyn ReleaseSettings>,
    commander: Arc<dyn MdmCommander>,
    engine: Arc<NextStepEngine>,
}

impl fmt::Debug for ReleaseTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseTrigger")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl ReleaseTrigger {
    pub fn new(
        hosts: Arc<dyn HostDirectory>,
        store: Arc<dyn SetupStepStore>,
        status_source: Arc<dyn ReleaseStatusSource>,
        settings: Arc<dyn ReleaseSettings>,
        commander: Arc<dyn MdmCommander>,
        engine: Arc<NextStepEngine>,
    ) -> Self {
        Self {
            hosts,
            store,
            status_source,
            settings,
            commander,
            engine,
        }
    }

    /// Release the device if allowed, then advance its setup experience
    #[instrument(skip_all, fields(host_uuid = %host_uuid, force_release = force_release))]
    pub async fn check_and_release(
        &self,
        host_uuid: &str,
        force_release: bool,
    ) -> SetupResult<ReleaseCheckOutcome> {
        let host = self
            .hosts
            .host_by_uuid(host_uuid)
            .await
            .map_err(|e| {
                error!(host_uuid = %host_uuid, error = %e, "Failed to look up host");
                e.wrap(format!("look up host {host_uuid}"))
            })?
            .ok_or_else(|| SetupError::not_found("host", host_uuid))?;

        let decision = self.decide_and_release(&host, force_release).await?;

        let sequence_finished = self
            .engine
            .advance_host(&host)
            .await
            .map_err(|e| e.wrap(format!("advance setup experience for host {host_uuid}")))?;

        metrics::record_release_check(decision.as_str());
        log_release_operation(
            "check_and_release",
            &host.uuid,
            host.team_id,
            decision.as_str(),
            Some(if sequence_finished {
                "sequence finished"
            } else {
                "sequence in progress"
            }),
        );

        Ok(ReleaseCheckOutcome {
            decision,
            sequence_finished,
        })
    }

    async fn decide_and_release(
        &self,
        host: &SetupHost,
        force_release: bool,
    ) -> SetupResult<ReleaseDecision> {
        if !host.platform.supports_device_release() {
            debug!(
                host_uuid = %host.uuid,
                platform = %host.platform,
                "Platform has no device release, skipping readiness check"
            );
            return Ok(ReleaseDecision::UnsupportedPlatform);
        }

        let payload = self.load_payload(host).await?;
        let readiness = evaluate(&payload);

        if !force_release && !readiness.is_ready() {
            debug!(
                host_uuid = %host.uuid,
                blockers = %readiness.summary(),
                "Device not ready for release"
            );
            return Ok(ReleaseDecision::NotReady);
        }

        let manual_release = self
            .settings
            .is_manual_release_enabled(host.team_id)
            .await
            .map_err(|e| {
                error!(host_uuid = %host.uuid, error = %e, "Failed to read manual release setting");
                e.wrap(format!("read manual release setting for team {:?}", host.team_id))
            })?;

        if manual_release {
            info!(
                host_uuid = %host.uuid,
                team_id = host.team_id,
                "Manual release enabled, leaving device for operator release"
            );
            return Ok(ReleaseDecision::ManualReleaseRequired);
        }

        let decision = Self::release_decision(&readiness);
        match decision {
            ReleaseDecision::ForceReleased => warn!(
                host_uuid = %host.uuid,
                blockers = %readiness.summary(),
                "Force releasing device with incomplete setup experience"
            ),
            _ => info!(host_uuid = %host.uuid, "Releasing device from awaiting configuration"),
        }

        self.commander
            .issue_device_configured(&host.uuid)
            .await
            .map_err(|e| {
                error!(host_uuid = %host.uuid, error = %e, "Failed to issue device configured command");
                e.wrap(format!("issue device configured command for host {}", host.uuid))
            })?;

        metrics::record_device_released(decision == ReleaseDecision::ForceReleased);
        Ok(decision)
    }

    fn release_decision(readiness: &ReleaseReadiness) -> ReleaseDecision {
        if readiness.is_ready() {
            ReleaseDecision::Released
        } else {
            ReleaseDecision::ForceReleased
        }
    }

    /// Assemble the host's release status from the collaborators and its step rows
    pub async fn load_payload(&self, host: &SetupHost) -> SetupResult<ReleaseStatusPayload> {
        let bootstrap_package = self
            .status_source
            .bootstrap_package_status(host)
            .await
            .map_err(|e| e.wrap("load bootstrap package status"))?;

        let configuration_profiles = self
            .status_source
            .configuration_profile_statuses(&host.uuid)
            .await
            .map_err(|e| e.wrap("load configuration profile statuses"))?;

        let account_configuration = self
            .status_source
            .account_configuration_status(&host.uuid)
            .await
            .map_err(|e| e.wrap("load account configuration command status"))?;

        let steps = self
            .store
            .list_steps(&host.uuid)
            .await
            .map_err(|e| e.wrap(format!("list setup experience steps for host {}", host.uuid)))?;

        let (software, script) = Self::step_results(&steps)?;

        Ok(ReleaseStatusPayload {
            bootstrap_package,
            account_configuration,
            configuration_profiles,
            software,
            script,
        })
    }

    /// Split rows into software results and the single script result
    ///
    /// A host is expected to carry at most one script row. If there are several,
    /// the first one still in flight is reported, otherwise the first row.
    fn step_results(
        steps: &[SetupExperienceStep],
    ) -> SetupResult<(Vec<StepResult>, Option<StepResult>)> {
        let mut software = Vec::new();
        let mut scripts = Vec::new();

        for step in steps {
            match step.category()? {
                StepCategory::SoftwareInstaller | StepCategory::VppApp => {
                    software.push(StepResult::from(step))
                }
                StepCategory::Script => scripts.push(step),
            }
        }

        let script = scripts
            .iter()
            .find(|step| !step.status.is_terminal())
            .or_else(|| scripts.first())
            .map(|step| StepResult::from(*step));

        Ok((software, script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepKind;
    use crate::state_machine::SetupStepStatus;

    #[test]
    fn test_step_results_split() {
        let mut done_script =
            SetupExperienceStep::pending(3, "host-1", "first.sh", StepKind::Script { script_id: 1 });
        done_script.status = SetupStepStatus::Success;
        done_script.execution_id = Some("exec-3".into());

        let steps = vec![
            SetupExperienceStep::pending(
                1,
                "host-1",
                "Firefox",
                StepKind::SoftwareInstaller { installer_id: 1 },
            ),
            SetupExperienceStep::pending(2, "host-1", "Slack", StepKind::VppApp { vpp_app_team_id: 1 }),
            done_script,
            SetupExperienceStep::pending(4, "host-1", "second.sh", StepKind::Script { script_id: 2 }),
        ];

        let (software, script) = ReleaseTrigger::step_results(&steps).unwrap();
        assert_eq!(software.len(), 2);
        assert_eq!(
            script,
            Some(StepResult::new("second.sh", SetupStepStatus::Pending))
        );
    }

    #[test]
    fn test_decision_labels() {
        assert_eq!(ReleaseDecision::ForceReleased.to_string(), "force_released");
        assert!(ReleaseDecision::Released.is_released());
        assert!(!ReleaseDecision::ManualReleaseRequired.is_released());
        assert!(!ReleaseDecision::UnsupportedPlatform.is_released());
    }
}
