//! # In-Memory Collaborators
//!
//! Thread-safe in-memory implementations of every setup experience collaborator, for
//! tests and local development.
//!
//! ## Features
//!
//! - **Recording**: queues and the MDM commander remember every call
//! - **Failure injection**: each fake can be told to fail, by id or after N calls
//! - **Completion pathway**: [`InMemorySetupStepStore::complete_step`] plays the part of
//!   the install and script result handlers that move Running rows to a terminal status
//!
//! ```rust
//! use setup_experience::providers::InMemoryProviders;
//! use setup_experience::config::SetupExperienceConfig;
//! use setup_experience::setup_experience::SetupExperienceService;
//!
//! let providers = InMemoryProviders::new(&SetupExperienceConfig::default());
//! let service = SetupExperienceService::new(
//!     providers.collaborators(),
//!     &SetupExperienceConfig::default(),
//! );
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::{ReleaseConfig, SetupExperienceConfig};
use crate::error::{SetupError, SetupResult};
use crate::models::{
    BootstrapPackageStatus, MdmCommandStatus, ProfileStatusEntry, ScriptRequest, SetupExperienceStep,
    SetupHost, SetupScript, VppAppMetadata,
};
use crate::setup_experience::service::SetupExperienceCollaborators;
use crate::setup_experience::traits::{
    HostDirectory, MdmCommander, ReleaseSettings, ReleaseStatusSource, ScriptRunner,
    SetupStepStore, SoftwareInstallQueue, VppInstaller,
};
use crate::state_machine::{SetupStepStateMachine, SetupStepStatus, StepEvent};

/// Step rows keyed by host UUID, then row id
#[derive(Debug, Default)]
pub struct InMemorySetupStepStore {
    rows: DashMap<String, BTreeMap<u32, SetupExperienceStep>>,
    update_count: AtomicU64,
    /// Number of further updates allowed before every update fails
    updates_before_failure: Mutex<Option<usize>>,
    list_failure: Mutex<Option<String>>,
}

impl InMemorySetupStepStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a row
    pub fn insert_step(&self, step: SetupExperienceStep) {
        self.rows
            .entry(step.host_uuid.clone())
            .or_default()
            .insert(step.id, step);
    }

    pub fn insert_steps(&self, steps: impl IntoIterator<Item = SetupExperienceStep>) {
        for step in steps {
            self.insert_step(step);
        }
    }

    pub fn steps_for(&self, host_uuid: &str) -> Vec<SetupExperienceStep> {
        self.rows
            .get(host_uuid)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn step(&self, host_uuid: &str, step_id: u32) -> Option<SetupExperienceStep> {
        self.rows
            .get(host_uuid)
            .and_then(|rows| rows.get(&step_id).cloned())
    }

    /// Apply a completion event to a row, as the install or script result handler would
    pub fn complete_step(
        &self,
        host_uuid: &str,
        step_id: u32,
        event: StepEvent,
    ) -> SetupResult<SetupStepStatus> {
        let mut rows = self
            .rows
            .get_mut(host_uuid)
            .ok_or_else(|| SetupError::not_found("host", host_uuid))?;
        let step = rows
            .get_mut(&step_id)
            .ok_or_else(|| SetupError::not_found("setup experience step", step_id.to_string()))?;

        Ok(SetupStepStateMachine::new().transition(step, event)?)
    }

    /// Mark every Running row of the host as Success
    pub fn succeed_running(&self, host_uuid: &str) -> usize {
        let machine = SetupStepStateMachine::new();
        self.rows
            .get_mut(host_uuid)
            .map(|mut rows| {
                rows.values_mut()
                    .filter(|step| step.status == SetupStepStatus::Running)
                    .filter_map(|step| machine.transition(step, StepEvent::Succeed).ok())
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn update_count(&self) -> u64 {
        self.update_count.load(Ordering::SeqCst)
    }

    /// Allow `count` more successful updates, then fail every update
    pub fn fail_updates_after(&self, count: usize) {
        *self.updates_before_failure.lock() = Some(count);
    }

    pub fn fail_list(&self, reason: impl Into<String>) {
        *self.list_failure.lock() = Some(reason.into());
    }

    pub fn clear_failures(&self) {
        *self.updates_before_failure.lock() = None;
        *self.list_failure.lock() = None;
    }
}

#[async_trait]
impl SetupStepStore for InMemorySetupStepStore {
    async fn list_steps(&self, host_uuid: &str) -> SetupResult<Vec<SetupExperienceStep>> {
        if let Some(reason) = self.list_failure.lock().clone() {
            return Err(SetupError::collaborator("list_steps", reason));
        }
        Ok(self.steps_for(host_uuid))
    }

    async fn update_step(&self, step: &SetupExperienceStep) -> SetupResult<bool> {
        {
            let mut remaining = self.updates_before_failure.lock();
            if let Some(count) = remaining.as_mut() {
                if *count == 0 {
                    return Err(SetupError::collaborator(
                        "update_step",
                        "injected update failure",
                    ));
                }
                *count -= 1;
            }
        }

        let mut rows = self
            .rows
            .get_mut(&step.host_uuid)
            .ok_or_else(|| SetupError::not_found("host", step.host_uuid.clone()))?;
        let row = rows
            .get_mut(&step.id)
            .ok_or_else(|| SetupError::not_found("setup experience step", step.id.to_string()))?;

        if step.status == SetupStepStatus::Running && row.status != SetupStepStatus::Pending {
            return Ok(false);
        }

        row.status = step.status;
        row.execution_id = step.execution_id.clone();
        row.error = step.error.clone();
        row.updated_at = step.updated_at;

        self.update_count.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// Software install queue that records requests and hands out sequential ids
#[derive(Debug, Default)]
pub struct RecordingInstallQueue {
    enqueued: Mutex<Vec<(u32, u32)>>,
    next_id: AtomicU64,
    failing_installers: Mutex<HashSet<u32>>,
}

impl RecordingInstallQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(host_id, installer_id)` pairs in enqueue order
    pub fn enqueued(&self) -> Vec<(u32, u32)> {
        self.enqueued.lock().clone()
    }

    pub fn fail_installer(&self, installer_id: u32) {
        self.failing_installers.lock().insert(installer_id);
    }
}

#[async_trait]
impl SoftwareInstallQueue for RecordingInstallQueue {
    async fn enqueue_install(&self, host_id: u32, installer_id: u32) -> SetupResult<String> {
        if self.failing_installers.lock().contains(&installer_id) {
            return Err(SetupError::collaborator(
                "enqueue_install",
                format!("installer {installer_id} rejected"),
            ));
        }

        self.enqueued.lock().push((host_id, installer_id));
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("install-{id}"))
    }
}

/// VPP installer backed by a table of configured apps
#[derive(Debug, Default)]
pub struct InMemoryVppInstaller {
    apps: DashMap<u32, VppAppMetadata>,
    enqueued: Mutex<Vec<(u32, u32)>>,
    failing_apps: Mutex<HashSet<u32>>,
}

impl InMemoryVppInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_app(&self, app: VppAppMetadata) {
        self.apps.insert(app.vpp_app_team_id, app);
    }

    /// `(host_id, vpp_app_team_id)` pairs in enqueue order
    pub fn enqueued(&self) -> Vec<(u32, u32)> {
        self.enqueued.lock().clone()
    }

    /// Reject install commands for this app
    pub fn fail_app(&self, vpp_app_team_id: u32) {
        self.failing_apps.lock().insert(vpp_app_team_id);
    }
}

#[async_trait]
impl VppInstaller for InMemoryVppInstaller {
    async fn vpp_app_metadata(
        &self,
        _team_id: Option<u32>,
        vpp_app_team_id: u32,
    ) -> SetupResult<VppAppMetadata> {
        self.apps
            .get(&vpp_app_team_id)
            .map(|app| app.value().clone())
            .ok_or_else(|| SetupError::not_found("vpp app", vpp_app_team_id.to_string()))
    }

    async fn enqueue_vpp_install(
        &self,
        host: &SetupHost,
        app: &VppAppMetadata,
    ) -> SetupResult<String> {
        if self.failing_apps.lock().contains(&app.vpp_app_team_id) {
            return Err(SetupError::collaborator(
                "enqueue_vpp_install",
                format!("install command for app {} rejected", app.adam_id),
            ));
        }

        self.enqueued.lock().push((host.id, app.vpp_app_team_id));
        Ok(Uuid::new_v4().to_string())
    }
}

/// Script runner backed by a table of setup scripts
#[derive(Debug, Default)]
pub struct InMemoryScriptRunner {
    scripts: DashMap<u32, SetupScript>,
    requests: Mutex<Vec<ScriptRequest>>,
    failing_scripts: Mutex<HashSet<u32>>,
}

impl InMemoryScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_script(&self, script: SetupScript) {
        self.scripts.insert(script.id, script);
    }

    pub fn requests(&self) -> Vec<ScriptRequest> {
        self.requests.lock().clone()
    }

    pub fn fail_script(&self, script_id: u32) {
        self.failing_scripts.lock().insert(script_id);
    }
}

#[async_trait]
impl ScriptRunner for InMemoryScriptRunner {
    async fn setup_script(&self, script_id: u32) -> SetupResult<SetupScript> {
        self.scripts
            .get(&script_id)
            .map(|script| script.value().clone())
            .ok_or_else(|| SetupError::not_found("setup script", script_id.to_string()))
    }

    async fn enqueue_script(&self, _host_id: u32, request: &ScriptRequest) -> SetupResult<String> {
        if self
            .failing_scripts
            .lock()
            .contains(&request.setup_experience_script_id)
        {
            return Err(SetupError::collaborator(
                "enqueue_script",
                format!("script {} rejected", request.script_name),
            ));
        }

        self.requests.lock().push(request.clone());
        Ok(Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, Default)]
struct HostReleaseStatus {
    bootstrap_package: Option<BootstrapPackageStatus>,
    account_configuration: Option<MdmCommandStatus>,
    configuration_profiles: Vec<ProfileStatusEntry>,
}

/// Release status keyed by host UUID; unknown hosts report nothing outstanding
#[derive(Debug, Default)]
pub struct InMemoryReleaseStatusSource {
    statuses: DashMap<String, HostReleaseStatus>,
    failure: Mutex<Option<String>>,
}

impl InMemoryReleaseStatusSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bootstrap_package(&self, host_uuid: &str, status: Option<BootstrapPackageStatus>) {
        self.statuses
            .entry(host_uuid.to_string())
            .or_default()
            .bootstrap_package = status;
    }

    pub fn set_account_configuration(&self, host_uuid: &str, status: Option<MdmCommandStatus>) {
        self.statuses
            .entry(host_uuid.to_string())
            .or_default()
            .account_configuration = status;
    }

    pub fn set_configuration_profiles(&self, host_uuid: &str, profiles: Vec<ProfileStatusEntry>) {
        self.statuses
            .entry(host_uuid.to_string())
            .or_default()
            .configuration_profiles = profiles;
    }

    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock() = Some(reason.into());
    }

    fn status(&self, host_uuid: &str, operation: &str) -> SetupResult<HostReleaseStatus> {
        if let Some(reason) = self.failure.lock().clone() {
            return Err(SetupError::collaborator(operation, reason));
        }
        Ok(self
            .statuses
            .get(host_uuid)
            .map(|status| status.value().clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ReleaseStatusSource for InMemoryReleaseStatusSource {
    async fn bootstrap_package_status(
        &self,
        host: &SetupHost,
    ) -> SetupResult<Option<BootstrapPackageStatus>> {
        Ok(self
            .status(&host.uuid, "bootstrap_package_status")?
            .bootstrap_package)
    }

    async fn configuration_profile_statuses(
        &self,
        host_uuid: &str,
    ) -> SetupResult<Vec<ProfileStatusEntry>> {
        Ok(self
            .status(host_uuid, "configuration_profile_statuses")?
            .configuration_profiles)
    }

    async fn account_configuration_status(
        &self,
        host_uuid: &str,
    ) -> SetupResult<Option<MdmCommandStatus>> {
        Ok(self
            .status(host_uuid, "account_configuration_status")?
            .account_configuration)
    }
}

/// Manual release settings read from [`ReleaseConfig`]
#[derive(Debug)]
pub struct ConfiguredReleaseSettings {
    manual_release_default: Mutex<bool>,
    team_overrides: DashMap<u32, bool>,
}

impl ConfiguredReleaseSettings {
    /// Team override keys are validated when configuration loads; any that do not
    /// parse are ignored here.
    pub fn from_config(config: &ReleaseConfig) -> Self {
        let team_overrides = DashMap::new();
        for (team, enabled) in &config.team_overrides {
            if let Ok(team_id) = team.parse::<u32>() {
                team_overrides.insert(team_id, *enabled);
            }
        }

        Self {
            manual_release_default: Mutex::new(config.manual_release_default),
            team_overrides,
        }
    }

    pub fn set_default(&self, enabled: bool) {
        *self.manual_release_default.lock() = enabled;
    }

    pub fn set_team(&self, team_id: u32, enabled: bool) {
        self.team_overrides.insert(team_id, enabled);
    }
}

impl Default for ConfiguredReleaseSettings {
    fn default() -> Self {
        Self::from_config(&ReleaseConfig::default())
    }
}

#[async_trait]
impl ReleaseSettings for ConfiguredReleaseSettings {
    async fn is_manual_release_enabled(&self, team_id: Option<u32>) -> SetupResult<bool> {
        let team_setting = team_id.and_then(|id| self.team_overrides.get(&id).map(|v| *v));
        Ok(team_setting.unwrap_or_else(|| *self.manual_release_default.lock()))
    }
}

/// MDM commander that records device-configured commands
#[derive(Debug, Default)]
pub struct RecordingMdmCommander {
    released: Mutex<Vec<String>>,
    failure: Mutex<Option<String>>,
}

impl RecordingMdmCommander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn released_hosts(&self) -> Vec<String> {
        self.released.lock().clone()
    }

    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock() = Some(reason.into());
    }
}

#[async_trait]
impl MdmCommander for RecordingMdmCommander {
    async fn issue_device_configured(&self, host_uuid: &str) -> SetupResult<()> {
        if let Some(reason) = self.failure.lock().clone() {
            return Err(SetupError::collaborator("issue_device_configured", reason));
        }
        self.released.lock().push(host_uuid.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHostDirectory {
    hosts: DashMap<String, SetupHost>,
}

impl InMemoryHostDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_host(&self, host: SetupHost) {
        self.hosts.insert(host.uuid.clone(), host);
    }
}

#[async_trait]
impl HostDirectory for InMemoryHostDirectory {
    async fn host_by_uuid(&self, host_uuid: &str) -> SetupResult<Option<SetupHost>> {
        Ok(self.hosts.get(host_uuid).map(|host| host.value().clone()))
    }
}

/// One of each in-memory collaborator, with typed handles kept for assertions
#[derive(Debug, Clone)]
pub struct InMemoryProviders {
    pub step_store: Arc<InMemorySetupStepStore>,
    pub install_queue: Arc<RecordingInstallQueue>,
    pub vpp_installer: Arc<InMemoryVppInstaller>,
    pub script_runner: Arc<InMemoryScriptRunner>,
    pub release_status: Arc<InMemoryReleaseStatusSource>,
    pub release_settings: Arc<ConfiguredReleaseSettings>,
    pub mdm_commander: Arc<RecordingMdmCommander>,
    pub host_directory: Arc<InMemoryHostDirectory>,
}

impl InMemoryProviders {
    pub fn new(config: &SetupExperienceConfig) -> Self {
        Self {
            step_store: Arc::new(InMemorySetupStepStore::new()),
            install_queue: Arc::new(RecordingInstallQueue::new()),
            vpp_installer: Arc::new(InMemoryVppInstaller::new()),
            script_runner: Arc::new(InMemoryScriptRunner::new()),
            release_status: Arc::new(InMemoryReleaseStatusSource::new()),
            release_settings: Arc::new(ConfiguredReleaseSettings::from_config(&config.release)),
            mdm_commander: Arc::new(RecordingMdmCommander::new()),
            host_directory: Arc::new(InMemoryHostDirectory::new()),
        }
    }

    pub fn collaborators(&self) -> SetupExperienceCollaborators {
        SetupExperienceCollaborators {
            step_store: self.step_store.clone(),
            install_queue: self.install_queue.clone(),
            vpp_installer: self.vpp_installer.clone(),
            script_runner: self.script_runner.clone(),
            release_status: self.release_status.clone(),
            release_settings: self.release_settings.clone(),
            mdm_commander: self.mdm_commander.clone(),
            host_directory: self.host_directory.clone(),
        }
    }

    /// Status of each row for the host, keyed by row id
    pub fn statuses(&self, host_uuid: &str) -> HashMap<u32, SetupStepStatus> {
        self.step_store
            .steps_for(host_uuid)
            .into_iter()
            .map(|step| (step.id, step.status))
            .collect()
    }
}
