use serde::{Deserialize, Serialize};
use std::fmt;

/// Setup experience step status as persisted per host row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SetupStepStatus {
    /// Row created for the host, nothing enqueued yet
    #[default]
    Pending,
    /// Work enqueued; an execution id or command UUID has been captured
    Running,
    /// Completed successfully
    Success,
    /// Completed with a failure
    Failure,
}

impl SetupStepStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    /// Check if this step is in flight
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if this step is still waiting to be enqueued
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for SetupStepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

impl std::str::FromStr for SetupStepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            _ => Err(format!("Invalid setup step status: {s}")),
        }
    }
}
