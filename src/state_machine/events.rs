use serde::{Deserialize, Serialize};

/// Events that can trigger setup step state transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StepEvent {
    /// Work was enqueued under the given execution id or command UUID
    Start { execution_id: String },
    /// The enqueued work reported success
    Succeed,
    /// The enqueued work reported failure, or the step was abandoned before starting
    Fail(String),
}

impl StepEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Succeed => "succeed",
            Self::Fail(_) => "fail",
        }
    }

    /// Create a start event for the given execution id
    pub fn start(execution_id: impl Into<String>) -> Self {
        Self::Start {
            execution_id: execution_id.into(),
        }
    }

    /// Create a failure event with the given error message
    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }

    /// Extract error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }

    /// Check if this event represents a terminal transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeed | Self::Fail(_))
    }
}
