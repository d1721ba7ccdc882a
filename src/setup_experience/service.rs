//! # Setup Experience Service
//!
//! Composition root for the setup experience. Collaborators are passed in explicitly
//! through [`SetupExperienceCollaborators`]; the service wires the engine and the
//! release trigger over them and exposes the three entry points check-in handlers use.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use setup_experience::config::SetupExperienceConfig;
//! use setup_experience::setup_experience::{SetupExperienceCollaborators, SetupExperienceService};
//!
//! # async fn example(collaborators: SetupExperienceCollaborators) -> Result<(), Box<dyn std::error::Error>> {
//! let service = Arc::new(SetupExperienceService::new(
//!     collaborators,
//!     &SetupExperienceConfig::default(),
//! ));
//!
//! let outcome = service.check_and_release("host-uuid", false).await?;
//! println!("{} (finished: {})", outcome.decision, outcome.sequence_finished);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::config::SetupExperienceConfig;
use crate::error::SetupResult;
use crate::metrics;
use crate::models::ReleaseStatusPayload;
use crate::setup_experience::engine::NextStepEngine;
use crate::setup_experience::readiness;
use crate::setup_experience::release::{ReleaseCheckOutcome, ReleaseTrigger};
use crate::setup_experience::traits::{
    HostDirectory, MdmCommander, ReleaseSettings, ReleaseStatusSource, ScriptRunner,
    SetupStepStore, SoftwareInstallQueue, VppInstaller,
};

/// Every external dependency of the setup experience, by name
#[derive(Clone)]
pub struct SetupExperienceCollaborators {
    pub step_store: Arc<dyn SetupStepStore>,
    pub install_queue: Arc<dyn SoftwareInstallQueue>,
    pub vpp_installer: Arc<dyn VppInstaller>,
    pub script_runner: Arc<dyn ScriptRunner>,
    pub release_status: Arc<dyn ReleaseStatusSource>,
    pub release_settings: Arc<dyn ReleaseSettings>,
    pub mdm_commander: Arc<dyn MdmCommander>,
    pub host_directory: Arc<dyn HostDirectory>,
}

#[derive(Debug)]
pub struct SetupExperienceService {
    engine: Arc<NextStepEngine>,
    release_trigger: ReleaseTrigger,
}

impl SetupExperienceService {
    pub fn new(collaborators: SetupExperienceCollaborators, config: &SetupExperienceConfig) -> Self {
        metrics::init_metrics(&config.telemetry);

        let engine = Arc::new(
            NextStepEngine::new(
                collaborators.step_store.clone(),
                collaborators.install_queue,
                collaborators.vpp_installer,
                collaborators.script_runner,
                collaborators.host_directory.clone(),
            )
            .with_stuck_step_threshold(config.setup_experience.stuck_step_threshold()),
        );

        let release_trigger = ReleaseTrigger::new(
            collaborators.host_directory,
            collaborators.step_store,
            collaborators.release_status,
            collaborators.release_settings,
            collaborators.mdm_commander,
            engine.clone(),
        );

        Self {
            engine,
            release_trigger,
        }
    }

    /// Enqueue the next category of setup work, returning `true` once finished
    pub async fn advance(&self, host_uuid: &str) -> SetupResult<bool> {
        self.engine.advance(host_uuid).await
    }

    pub fn is_ready(&self, payload: &ReleaseStatusPayload) -> bool {
        readiness::is_ready(payload)
    }

    pub async fn check_and_release(
        &self,
        host_uuid: &str,
        force_release: bool,
    ) -> SetupResult<ReleaseCheckOutcome> {
        self.release_trigger
            .check_and_release(host_uuid, force_release)
            .await
    }

    pub fn engine(&self) -> &Arc<NextStepEngine> {
        &self.engine
    }

    pub fn release_trigger(&self) -> &ReleaseTrigger {
        &self.release_trigger
    }
}
