//! # Release Status Payload
//!
//! Everything the readiness evaluator looks at for one host on one check-in. The
//! payload is assembled fresh each time from the release status source and the
//! step store and is never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::SetupExperienceStep;
use crate::state_machine::SetupStepStatus;

/// Install status of the team's bootstrap package on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapPackageStatus {
    Pending,
    Installed,
    Failed,
}

impl BootstrapPackageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Installed | Self::Failed)
    }
}

impl fmt::Display for BootstrapPackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Installed => write!(f, "installed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Status of an MDM command as acknowledged by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MdmCommandStatus {
    Pending,
    Acknowledged,
    Error,
    CommandFormatError,
    NotNow,
    Idle,
}

impl MdmCommandStatus {
    /// The device answered and will not answer again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Acknowledged | Self::Error | Self::CommandFormatError
        )
    }

    /// Parse the status string returned by the MDM server
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "Pending" => Some(Self::Pending),
            "Acknowledged" => Some(Self::Acknowledged),
            "Error" => Some(Self::Error),
            "CommandFormatError" => Some(Self::CommandFormatError),
            "NotNow" => Some(Self::NotNow),
            "Idle" => Some(Self::Idle),
            _ => None,
        }
    }
}

impl fmt::Display for MdmCommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Acknowledged => write!(f, "acknowledged"),
            Self::Error => write!(f, "error"),
            Self::CommandFormatError => write!(f, "command_format_error"),
            Self::NotNow => write!(f, "not_now"),
            Self::Idle => write!(f, "idle"),
        }
    }
}

/// Delivery status of a configuration profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileDeliveryStatus {
    Pending,
    Verifying,
    Verified,
    Failed,
}

impl ProfileDeliveryStatus {
    /// Verifying counts: the device has installed the profile
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Verifying | Self::Verified | Self::Failed)
    }
}

impl fmt::Display for ProfileDeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Verifying => write!(f, "verifying"),
            Self::Verified => write!(f, "verified"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStatusEntry {
    pub name: String,
    pub status: ProfileDeliveryStatus,
}

impl ProfileStatusEntry {
    pub fn new(name: impl Into<String>, status: ProfileDeliveryStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// Name and status of one setup step, as reported in the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub status: SetupStepStatus,
}

impl StepResult {
    pub fn new(name: impl Into<String>, status: SetupStepStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

impl From<&SetupExperienceStep> for StepResult {
    fn from(step: &SetupExperienceStep) -> Self {
        Self::new(step.name.clone(), step.status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseStatusPayload {
    pub bootstrap_package: Option<BootstrapPackageStatus>,
    pub account_configuration: Option<MdmCommandStatus>,
    pub configuration_profiles: Vec<ProfileStatusEntry>,
    /// Software installer and VPP app steps
    pub software: Vec<StepResult>,
    pub script: Option<StepResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(BootstrapPackageStatus::Failed.is_terminal());
        assert!(!BootstrapPackageStatus::Pending.is_terminal());

        assert!(MdmCommandStatus::CommandFormatError.is_terminal());
        assert!(!MdmCommandStatus::NotNow.is_terminal());
        assert!(!MdmCommandStatus::Idle.is_terminal());

        assert!(ProfileDeliveryStatus::Verifying.is_delivered());
        assert!(!ProfileDeliveryStatus::Pending.is_delivered());
    }

    #[test]
    fn test_mdm_status_parsing() {
        assert_eq!(
            MdmCommandStatus::parse("Acknowledged"),
            Some(MdmCommandStatus::Acknowledged)
        );
        assert_eq!(MdmCommandStatus::parse("acknowledged"), None);
    }

    #[test]
    fn test_default_payload_is_empty() {
        let payload = ReleaseStatusPayload::default();
        assert!(payload.bootstrap_package.is_none());
        assert!(payload.software.is_empty());
        assert!(payload.script.is_none());
    }
}
