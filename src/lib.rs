#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Setup Experience Core
//!
//! Sequencing core for the setup experience of newly enrolled devices in a device
//! management platform.
//!
//! ## Overview
//!
//! Between enrollment and hand-off to the end user, a device receives an ordered
//! pipeline of work: custom software packages, then App Store (VPP) apps, then setup
//! scripts. This crate tracks each unit of work as a persisted step moving through
//! Pending, Running, Success and Failure, enqueues the next category of work on every
//! device check-in and decides when the device can be released from "awaiting
//! configuration".
//!
//! ## Module Organization
//!
//! - [`models`] - Step rows, hosts, release status payloads
//! - [`state_machine`] - Step lifecycle rules
//! - [`setup_experience`] - Classifier, next-step engine, readiness, release trigger, service
//! - [`providers`] - In-memory and PostgreSQL collaborator implementations
//! - [`config`] - Layered, environment-aware configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured console logging
//! - [`metrics`] - OpenTelemetry counters
//!
//! ## Quick Start
//!
//! ```rust
//! use setup_experience::config::SetupExperienceConfig;
//! use setup_experience::models::{HostPlatform, SetupExperienceStep, SetupHost, StepKind};
//! use setup_experience::providers::InMemoryProviders;
//! use setup_experience::SetupExperienceService;
//!
//! # async fn example() -> Result<(), setup_experience::SetupError> {
//! let config = SetupExperienceConfig::default();
//! let providers = InMemoryProviders::new(&config);
//! providers
//!     .host_directory
//!     .add_host(SetupHost::new(1, "host-uuid", None, HostPlatform::MacOs));
//! providers.step_store.insert_step(SetupExperienceStep::pending(
//!     1,
//!     "host-uuid",
//!     "Firefox",
//!     StepKind::SoftwareInstaller { installer_id: 10 },
//! ));
//!
//! let service = SetupExperienceService::new(providers.collaborators(), &config);
//! let finished = service.advance("host-uuid").await?;
//! assert!(!finished);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod providers;
pub mod setup_experience;
pub mod state_machine;

pub use config::{ConfigManager, ConfigurationError, SetupExperienceConfig};
pub use error::{ErrorKind, SetupError, SetupResult};
pub use models::{
    HostPlatform, ReleaseStatusPayload, SetupExperienceStep, SetupHost, StepCategory, StepKind,
};
pub use setup_experience::{
    NextStepEngine, ReleaseCheckOutcome, ReleaseDecision, ReleaseTrigger,
    SetupExperienceCollaborators, SetupExperienceService,
};
pub use state_machine::{SetupStepStateMachine, SetupStepStatus, StepEvent};
