//! # Collaborator Providers
//!
//! Implementations of the setup experience collaborator traits.
//!
//! - [`in_memory`]: every collaborator, for tests and local development
//! - [`postgres`]: the step store over PostgreSQL (feature `postgres`)

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::{
    ConfiguredReleaseSettings, InMemoryHostDirectory, InMemoryProviders,
    InMemoryReleaseStatusSource, InMemoryScriptRunner, InMemorySetupStepStore,
    InMemoryVppInstaller, RecordingInstallQueue, RecordingMdmCommander,
};
#[cfg(feature = "postgres")]
pub use postgres::{PgSetupStepStore, SetupStepRow};
