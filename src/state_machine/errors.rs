use thiserror::Error;

/// Error types for setup step state transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid state transition from {from} on event {event} for step {step_id}")]
    InvalidTransition {
        step_id: u32,
        from: String,
        event: String,
    },

    #[error("Step {step_id} cannot start without an execution id")]
    MissingExecutionId { step_id: u32 },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for state machine operations
pub type StateMachineResult<T> = Result<T, StateMachineError>;
