//! # Release Readiness
//!
//! Pure decision over a [`ReleaseStatusPayload`]: a device is ready for release once
//! every item in the payload has reached a terminal status. Failures count as
//! terminal, so one broken profile or installer never holds a device back.

use serde::Serialize;
use std::fmt;

use crate::models::{
    BootstrapPackageStatus, MdmCommandStatus, ProfileDeliveryStatus, ReleaseStatusPayload,
};
use crate::state_machine::SetupStepStatus;

/// One item keeping a device from being released
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum ReleaseBlocker {
    BootstrapPackage {
        status: BootstrapPackageStatus,
    },
    AccountConfiguration {
        status: MdmCommandStatus,
    },
    ConfigurationProfile {
        name: String,
        status: ProfileDeliveryStatus,
    },
    Software {
        name: String,
        status: SetupStepStatus,
    },
    Script {
        name: String,
        status: SetupStepStatus,
    },
}

impl fmt::Display for ReleaseBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BootstrapPackage { status } => write!(f, "bootstrap package is {status}"),
            Self::AccountConfiguration { status } => {
                write!(f, "account configuration command is {status}")
            }
            Self::ConfigurationProfile { name, status } => {
                write!(f, "configuration profile {name} is {status}")
            }
            Self::Software { name, status } => write!(f, "software {name} is {status}"),
            Self::Script { name, status } => write!(f, "script {name} is {status}"),
        }
    }
}

/// Full readiness report, listing every blocker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseReadiness {
    pub blockers: Vec<ReleaseBlocker>,
}

impl ReleaseReadiness {
    pub fn is_ready(&self) -> bool {
        self.blockers.is_empty()
    }

    /// Blockers joined for log output
    pub fn summary(&self) -> String {
        self.blockers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Lazily yield every item that still blocks release, in payload order
pub fn blockers(payload: &ReleaseStatusPayload) -> impl Iterator<Item = ReleaseBlocker> + '_ {
    let bootstrap = payload
        .bootstrap_package
        .filter(|status| !status.is_terminal())
        .map(|status| ReleaseBlocker::BootstrapPackage { status });

    let account = payload
        .account_configuration
        .filter(|status| !status.is_terminal())
        .map(|status| ReleaseBlocker::AccountConfiguration { status });

    let profiles = payload
        .configuration_profiles
        .iter()
        .filter(|profile| !profile.status.is_delivered())
        .map(|profile| ReleaseBlocker::ConfigurationProfile {
            name: profile.name.clone(),
            status: profile.status,
        });

    let software = payload
        .software
        .iter()
        .filter(|step| !step.status.is_terminal())
        .map(|step| ReleaseBlocker::Software {
            name: step.name.clone(),
            status: step.status,
        });

    let script = payload
        .script
        .iter()
        .filter(|step| !step.status.is_terminal())
        .map(|step| ReleaseBlocker::Script {
            name: step.name.clone(),
            status: step.status,
        });

    bootstrap
        .into_iter()
        .chain(account)
        .chain(profiles)
        .chain(software)
        .chain(script)
}

/// Whether the device can be released, stopping at the first blocker
pub fn is_ready(payload: &ReleaseStatusPayload) -> bool {
    blockers(payload).next().is_none()
}

pub fn evaluate(payload: &ReleaseStatusPayload) -> ReleaseReadiness {
    ReleaseReadiness {
        blockers: blockers(payload).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProfileStatusEntry, StepResult};

    fn terminal_payload() -> ReleaseStatusPayload {
        ReleaseStatusPayload {
            bootstrap_package: Some(BootstrapPackageStatus::Installed),
            account_configuration: Some(MdmCommandStatus::Acknowledged),
            configuration_profiles: vec![ProfileStatusEntry::new(
                "Wi-Fi",
                ProfileDeliveryStatus::Verified,
            )],
            software: vec![StepResult::new("Firefox", SetupStepStatus::Success)],
            script: Some(StepResult::new("setup.sh", SetupStepStatus::Success)),
        }
    }

    #[test]
    fn test_empty_payload_is_ready() {
        assert!(is_ready(&ReleaseStatusPayload::default()));
    }

    #[test]
    fn test_terminal_payload_is_ready() {
        assert!(is_ready(&terminal_payload()));
        assert!(evaluate(&terminal_payload()).is_ready());
    }

    #[test]
    fn test_bootstrap_pending_blocks() {
        let payload = ReleaseStatusPayload {
            bootstrap_package: Some(BootstrapPackageStatus::Pending),
            ..terminal_payload()
        };
        assert!(!is_ready(&payload));
        assert_eq!(
            evaluate(&payload).blockers,
            vec![ReleaseBlocker::BootstrapPackage {
                status: BootstrapPackageStatus::Pending
            }]
        );
    }

    #[test]
    fn test_summary_uses_snake_case_statuses() {
        let payload = ReleaseStatusPayload {
            bootstrap_package: Some(BootstrapPackageStatus::Pending),
            account_configuration: Some(MdmCommandStatus::NotNow),
            configuration_profiles: vec![ProfileStatusEntry::new(
                "VPN",
                ProfileDeliveryStatus::Pending,
            )],
            software: vec![],
            script: None,
        };
        assert_eq!(
            evaluate(&payload).summary(),
            "bootstrap package is pending; account configuration command is not_now; \
             configuration profile VPN is pending"
        );
    }

    #[test]
    fn test_failures_count_as_terminal() {
        let payload = ReleaseStatusPayload {
            bootstrap_package: Some(BootstrapPackageStatus::Failed),
            account_configuration: Some(MdmCommandStatus::CommandFormatError),
            configuration_profiles: vec![
                ProfileStatusEntry::new("VPN", ProfileDeliveryStatus::Failed),
                ProfileStatusEntry::new("Wi-Fi", ProfileDeliveryStatus::Verifying),
            ],
            software: vec![StepResult::new("Firefox", SetupStepStatus::Failure)],
            script: Some(StepResult::new("setup.sh", SetupStepStatus::Failure)),
        };
        assert!(is_ready(&payload));
    }

    #[test]
    fn test_account_configuration_not_now_blocks() {
        for status in [
            MdmCommandStatus::Pending,
            MdmCommandStatus::NotNow,
            MdmCommandStatus::Idle,
        ] {
            let payload = ReleaseStatusPayload {
                account_configuration: Some(status),
                ..terminal_payload()
            };
            assert!(!is_ready(&payload), "{status:?} should block release");
        }
    }

    #[test]
    fn test_evaluate_lists_every_blocker() {
        let payload = ReleaseStatusPayload {
            bootstrap_package: None,
            account_configuration: None,
            configuration_profiles: vec![ProfileStatusEntry::new(
                "FileVault",
                ProfileDeliveryStatus::Pending,
            )],
            software: vec![
                StepResult::new("Firefox", SetupStepStatus::Running),
                StepResult::new("Slack", SetupStepStatus::Success),
                StepResult::new("Zoom", SetupStepStatus::Pending),
            ],
            script: Some(StepResult::new("setup.sh", SetupStepStatus::Pending)),
        };

        let readiness = evaluate(&payload);
        assert!(!readiness.is_ready());
        assert_eq!(readiness.blockers.len(), 4);
        assert_eq!(
            readiness.summary(),
            "configuration profile FileVault is pending; software Firefox is running; \
             software Zoom is pending; script setup.sh is pending"
        );
    }
}
