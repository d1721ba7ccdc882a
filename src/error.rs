//! Error types for the setup experience core.
//!
//! Every fallible operation returns [`SetupResult`]. Callers that need to branch on
//! the failure category use [`SetupError::kind`] rather than matching on variants,
//! so the taxonomy stays stable when new variants are added.

use crate::state_machine::errors::StateMachineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable classification of a [`SetupError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A persisted row is malformed or a transition violated the step lifecycle
    DataIntegrity,
    /// An external collaborator (queue, store, MDM commander) failed
    Collaborator,
    /// A host, team, app or script could not be found
    NotFound,
    /// Configuration could not be loaded or is invalid
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataIntegrity => write!(f, "data_integrity"),
            Self::Collaborator => write!(f, "collaborator"),
            Self::NotFound => write!(f, "not_found"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid setup experience row {step_id} for host {host_uuid}: {reason}")]
    InvalidRow {
        host_uuid: String,
        step_id: u32,
        reason: String,
    },

    #[error("State transition error: {0}")]
    StateTransition(#[from] StateMachineError),

    #[error("Collaborator operation {operation} failed: {reason}")]
    Collaborator { operation: String, reason: String },

    #[error("{entity} not found: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{context}: {source}")]
    Wrapped {
        context: String,
        #[source]
        source: Box<SetupError>,
    },
}

impl SetupError {
    /// Category of this error, looking through any wrapping context
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRow { .. } | Self::StateTransition(_) => ErrorKind::DataIntegrity,
            Self::Collaborator { .. } => ErrorKind::Collaborator,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Wrapped { source, .. } => source.kind(),
        }
    }

    /// Attach operation context without changing the error kind
    pub fn wrap(self, context: impl Into<String>) -> Self {
        Self::Wrapped {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping wrapping context
    pub fn root(&self) -> &SetupError {
        match self {
            Self::Wrapped { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn collaborator(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Collaborator {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &'static str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            identifier: identifier.into(),
        }
    }

    pub fn invalid_row(host_uuid: impl Into<String>, step_id: u32, reason: impl Into<String>) -> Self {
        Self::InvalidRow {
            host_uuid: host_uuid.into(),
            step_id,
            reason: reason.into(),
        }
    }
}

impl From<sqlx::Error> for SetupError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => SetupError::not_found("row", "query returned no rows"),
            other => SetupError::collaborator("database", other.to_string()),
        }
    }
}

impl From<crate::config::ConfigurationError> for SetupError {
    fn from(err: crate::config::ConfigurationError) -> Self {
        SetupError::Configuration(err.to_string())
    }
}

pub type SetupResult<T> = Result<T, SetupError>;
