//! # Setup Experience Step
//!
//! One persisted row per unit of setup work for a host. A row names exactly one
//! piece of content through one of three mutually exclusive foreign keys:
//!
//! | column | kind |
//! |---|---|
//! | `software_installer_id` | [`StepKind::SoftwareInstaller`] |
//! | `vpp_app_team_id` | [`StepKind::VppApp`] |
//! | `setup_experience_script_id` | [`StepKind::Script`] |
//!
//! Rows are created Pending when content is assigned to the host's team, moved to
//! Running by the next-step engine, and moved to Success or Failure by whichever
//! pathway observes the result. They are never deleted while the sequence runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SetupError, SetupResult};
use crate::state_machine::SetupStepStatus;

/// Category of setup work, ordered by precedence
///
/// All installers run before any VPP app starts, and all VPP apps before any script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCategory {
    SoftwareInstaller,
    VppApp,
    Script,
}

impl StepCategory {
    pub const ALL: [StepCategory; 3] = [Self::SoftwareInstaller, Self::VppApp, Self::Script];

    /// Lower numbers run first
    pub fn precedence(&self) -> u8 {
        match self {
            Self::SoftwareInstaller => 0,
            Self::VppApp => 1,
            Self::Script => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoftwareInstaller => "software_installer",
            Self::VppApp => "vpp_app",
            Self::Script => "script",
        }
    }
}

impl fmt::Display for StepCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The content a step refers to, resolved from its discriminator columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    SoftwareInstaller { installer_id: u32 },
    VppApp { vpp_app_team_id: u32 },
    Script { script_id: u32 },
}

impl StepKind {
    pub fn category(&self) -> StepCategory {
        match self {
            Self::SoftwareInstaller { .. } => StepCategory::SoftwareInstaller,
            Self::VppApp { .. } => StepCategory::VppApp,
            Self::Script { .. } => StepCategory::Script,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupExperienceStep {
    pub id: u32,
    pub host_uuid: String,
    pub name: String,
    pub status: SetupStepStatus,
    pub software_installer_id: Option<u32>,
    pub vpp_app_team_id: Option<u32>,
    pub setup_experience_script_id: Option<u32>,
    /// Install execution id, MDM command UUID or script execution id, depending on kind
    pub execution_id: Option<String>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SetupExperienceStep {
    /// Create a Pending row for the given content
    pub fn pending(id: u32, host_uuid: impl Into<String>, name: impl Into<String>, kind: StepKind) -> Self {
        let (software_installer_id, vpp_app_team_id, setup_experience_script_id) = match kind {
            StepKind::SoftwareInstaller { installer_id } => (Some(installer_id), None, None),
            StepKind::VppApp { vpp_app_team_id } => (None, Some(vpp_app_team_id), None),
            StepKind::Script { script_id } => (None, None, Some(script_id)),
        };

        Self {
            id,
            host_uuid: host_uuid.into(),
            name: name.into(),
            status: SetupStepStatus::Pending,
            software_installer_id,
            vpp_app_team_id,
            setup_experience_script_id,
            execution_id: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Resolve the discriminator columns into a [`StepKind`]
    ///
    /// Exactly one of the three foreign keys must be set.
    pub fn kind(&self) -> SetupResult<StepKind> {
        match (
            self.software_installer_id,
            self.vpp_app_team_id,
            self.setup_experience_script_id,
        ) {
            (Some(installer_id), None, None) => Ok(StepKind::SoftwareInstaller { installer_id }),
            (None, Some(vpp_app_team_id), None) => Ok(StepKind::VppApp { vpp_app_team_id }),
            (None, None, Some(script_id)) => Ok(StepKind::Script { script_id }),
            (None, None, None) => Err(SetupError::invalid_row(
                &self.host_uuid,
                self.id,
                "no content discriminator is set",
            )),
            _ => Err(SetupError::invalid_row(
                &self.host_uuid,
                self.id,
                "more than one content discriminator is set",
            )),
        }
    }

    pub fn category(&self) -> SetupResult<StepCategory> {
        self.kind().map(|kind| kind.category())
    }

    /// Check the row shape and return its kind
    ///
    /// Pending rows carry no execution id and Running rows carry a non-empty one.
    /// Terminal rows are written by completion pathways and are not constrained here.
    pub fn validate(&self) -> SetupResult<StepKind> {
        let kind = self.kind()?;

        match (self.status, self.execution_id.as_deref()) {
            (SetupStepStatus::Pending, Some(execution_id)) => Err(SetupError::invalid_row(
                &self.host_uuid,
                self.id,
                format!("pending row already has execution id {execution_id}"),
            )),
            (SetupStepStatus::Running, None) => Err(SetupError::invalid_row(
                &self.host_uuid,
                self.id,
                "running row has no execution id",
            )),
            (SetupStepStatus::Running, Some(execution_id)) if execution_id.is_empty() => {
                Err(SetupError::invalid_row(
                    &self.host_uuid,
                    self.id,
                    "running row has an empty execution id",
                ))
            }
            _ => Ok(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_pending_constructor_sets_single_discriminator() {
        let step = SetupExperienceStep::pending(
            1,
            "host-1",
            "Firefox",
            StepKind::SoftwareInstaller { installer_id: 10 },
        );
        assert_eq!(step.software_installer_id, Some(10));
        assert!(step.vpp_app_team_id.is_none());
        assert!(step.setup_experience_script_id.is_none());
        assert_eq!(step.status, SetupStepStatus::Pending);
        assert_eq!(
            step.kind().unwrap(),
            StepKind::SoftwareInstaller { installer_id: 10 }
        );
    }

    #[test]
    fn test_ambiguous_discriminator_is_invalid() {
        let mut step =
            SetupExperienceStep::pending(2, "host-1", "Slack", StepKind::VppApp { vpp_app_team_id: 3 });
        step.setup_experience_script_id = Some(9);

        let err = step.kind().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataIntegrity);
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn test_missing_discriminator_is_invalid() {
        let mut step =
            SetupExperienceStep::pending(3, "host-1", "setup.sh", StepKind::Script { script_id: 4 });
        step.setup_experience_script_id = None;

        assert!(step.kind().is_err());
    }

    #[test]
    fn test_execution_id_shape_rules() {
        let mut step =
            SetupExperienceStep::pending(4, "host-1", "setup.sh", StepKind::Script { script_id: 4 });
        assert!(step.validate().is_ok());

        step.execution_id = Some("exec-1".into());
        assert!(step.validate().is_err(), "pending rows must not carry an id");

        step.status = SetupStepStatus::Running;
        assert!(step.validate().is_ok());

        step.execution_id = None;
        assert!(step.validate().is_err(), "running rows need an id");

        step.status = SetupStepStatus::Failure;
        assert!(step.validate().is_ok(), "terminal rows are unconstrained");
    }

    #[test]
    fn test_category_precedence_ordering() {
        assert!(StepCategory::SoftwareInstaller < StepCategory::VppApp);
        assert!(StepCategory::VppApp < StepCategory::Script);
        assert_eq!(StepCategory::ALL.map(|c| c.precedence()), [0, 1, 2]);
        assert_eq!(StepCategory::VppApp.to_string(), "vpp_app");
    }
}
