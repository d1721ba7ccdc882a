//! # Collaborator Traits
//!
//! Narrow async interfaces to everything the setup experience consumes but does not
//! own: the step store, the install and script queues, the MDM commander and the
//! sources of release status. Implementations live in [`crate::providers`]; hosts
//! embedding this crate supply their own.
//!
//! Every method returns [`SetupResult`]. Implementations report their own failures
//! as [`SetupError::Collaborator`](crate::error::SetupError::Collaborator) and missing
//! entities as [`SetupError::NotFound`](crate::error::SetupError::NotFound).

use async_trait::async_trait;

use crate::error::SetupResult;
use crate::models::{
    BootstrapPackageStatus, MdmCommandStatus, ProfileStatusEntry, ScriptRequest, SetupExperienceStep,
    SetupHost, SetupScript, VppAppMetadata,
};

/// Persistence for per-host setup experience rows
#[async_trait]
pub trait SetupStepStore: Send + Sync + 'static {
    /// All rows for the host, in id order
    async fn list_steps(&self, host_uuid: &str) -> SetupResult<Vec<SetupExperienceStep>>;

    /// Persist status, execution id and error of a single row
    ///
    /// The update must be atomic per row. A Running write only applies while the
    /// stored row is still Pending; otherwise nothing is written and `false` is
    /// returned.
    async fn update_step(&self, step: &SetupExperienceStep) -> SetupResult<bool>;
}

/// Queue for custom software package installs
#[async_trait]
pub trait SoftwareInstallQueue: Send + Sync + 'static {
    /// Queue an install of the installer on the host, returning its execution id
    async fn enqueue_install(&self, host_id: u32, installer_id: u32) -> SetupResult<String>;
}

/// App Store (VPP) app installation through MDM
#[async_trait]
pub trait VppInstaller: Send + Sync + 'static {
    async fn vpp_app_metadata(
        &self,
        team_id: Option<u32>,
        vpp_app_team_id: u32,
    ) -> SetupResult<VppAppMetadata>;

    /// Send the install command, returning the MDM command UUID
    async fn enqueue_vpp_install(
        &self,
        host: &SetupHost,
        app: &VppAppMetadata,
    ) -> SetupResult<String>;
}

#[async_trait]
pub trait ScriptRunner: Send + Sync + 'static {
    async fn setup_script(&self, script_id: u32) -> SetupResult<SetupScript>;

    /// Queue the script for execution, returning its execution id
    async fn enqueue_script(&self, host_id: u32, request: &ScriptRequest) -> SetupResult<String>;
}

/// Status of the MDM-delivered parts of the setup experience
#[async_trait]
pub trait ReleaseStatusSource: Send + Sync + 'static {
    /// `None` when the team has no bootstrap package
    async fn bootstrap_package_status(
        &self,
        host: &SetupHost,
    ) -> SetupResult<Option<BootstrapPackageStatus>>;

    async fn configuration_profile_statuses(
        &self,
        host_uuid: &str,
    ) -> SetupResult<Vec<ProfileStatusEntry>>;

    /// `None` when no account configuration command was sent
    async fn account_configuration_status(
        &self,
        host_uuid: &str,
    ) -> SetupResult<Option<MdmCommandStatus>>;
}

#[async_trait]
pub trait ReleaseSettings: Send + Sync + 'static {
    /// Team setting, or the global setting when `team_id` is `None`
    async fn is_manual_release_enabled(&self, team_id: Option<u32>) -> SetupResult<bool>;
}

#[async_trait]
pub trait MdmCommander: Send + Sync + 'static {
    /// Send the command that ends "awaiting configuration" on the device
    async fn issue_device_configured(&self, host_uuid: &str) -> SetupResult<()>;
}

#[async_trait]
pub trait HostDirectory: Send + Sync + 'static {
    async fn host_by_uuid(&self, host_uuid: &str) -> SetupResult<Option<SetupHost>>;
}
