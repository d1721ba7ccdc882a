//! # Setup Experience Sequencing
//!
//! Orders the setup work applied to a newly enrolled device and decides when the
//! device can leave "awaiting configuration".
//!
//! - [`classifier`]: partitions a host's rows by category and status
//! - [`engine`]: enqueues the next category of work
//! - [`readiness`]: decides whether a device can be released
//! - [`release`]: releases the device and keeps the engine moving
//! - [`staleness`]: reports steps that have been running too long
//! - [`service`]: wires the above over explicit collaborators

pub mod classifier;
pub mod engine;
pub mod readiness;
pub mod release;
pub mod service;
pub mod staleness;
pub mod traits;

pub use classifier::{classify, CategoryState, ClassifiedSteps};
pub use engine::NextStepEngine;
pub use readiness::{evaluate, is_ready, ReleaseBlocker, ReleaseReadiness};
pub use release::{ReleaseCheckOutcome, ReleaseDecision, ReleaseTrigger};
pub use service::{SetupExperienceCollaborators, SetupExperienceService};
pub use staleness::{stale_running_steps, StaleStep};
pub use traits::{
    HostDirectory, MdmCommander, ReleaseSettings, ReleaseStatusSource, ScriptRunner,
    SetupStepStore, SoftwareInstallQueue, VppInstaller,
};
