//! Test data builders for setup experience integration tests.

#![allow(dead_code)]

use setup_experience::config::SetupExperienceConfig;
use setup_experience::models::{
    HostPlatform, SetupExperienceStep, SetupHost, SetupScript, StepKind, VppAppMetadata,
};
use setup_experience::providers::InMemoryProviders;
use setup_experience::setup_experience::SetupExperienceService;
use setup_experience::state_machine::SetupStepStatus;

/// Builder for setup experience rows
pub struct StepBuilder {
    step: SetupExperienceStep,
}

impl StepBuilder {
    pub fn installer(id: u32, host_uuid: &str, installer_id: u32) -> Self {
        Self {
            step: SetupExperienceStep::pending(
                id,
                host_uuid,
                format!("installer-{installer_id}"),
                StepKind::SoftwareInstaller { installer_id },
            ),
        }
    }

    pub fn vpp_app(id: u32, host_uuid: &str, vpp_app_team_id: u32) -> Self {
        Self {
            step: SetupExperienceStep::pending(
                id,
                host_uuid,
                format!("vpp-app-{vpp_app_team_id}"),
                StepKind::VppApp { vpp_app_team_id },
            ),
        }
    }

    pub fn script(id: u32, host_uuid: &str, script_id: u32) -> Self {
        Self {
            step: SetupExperienceStep::pending(
                id,
                host_uuid,
                format!("script-{script_id}.sh"),
                StepKind::Script { script_id },
            ),
        }
    }

    /// Running with a generated execution id
    pub fn running(self) -> Self {
        let execution_id = format!("exec-{}", self.step.id);
        self.with_status(SetupStepStatus::Running, Some(execution_id))
    }

    pub fn succeeded(self) -> Self {
        let execution_id = format!("exec-{}", self.step.id);
        self.with_status(SetupStepStatus::Success, Some(execution_id))
    }

    pub fn failed(mut self, error: &str) -> Self {
        self.step.error = Some(error.to_string());
        let execution_id = format!("exec-{}", self.step.id);
        self.with_status(SetupStepStatus::Failure, Some(execution_id))
    }

    pub fn with_status(mut self, status: SetupStepStatus, execution_id: Option<String>) -> Self {
        self.step.status = status;
        self.step.execution_id = execution_id;
        self
    }

    pub fn updated_at(mut self, updated_at: chrono::DateTime<chrono::Utc>) -> Self {
        self.step.updated_at = updated_at;
        self
    }

    pub fn build(self) -> SetupExperienceStep {
        self.step
    }
}

/// In-memory collaborators plus a service wired over them
pub struct SetupExperienceHarness {
    pub config: SetupExperienceConfig,
    pub providers: InMemoryProviders,
    pub service: SetupExperienceService,
}

impl SetupExperienceHarness {
    pub fn new() -> Self {
        Self::with_config(SetupExperienceConfig::default())
    }

    pub fn with_config(config: SetupExperienceConfig) -> Self {
        let providers = InMemoryProviders::new(&config);
        let service = SetupExperienceService::new(providers.collaborators(), &config);
        Self {
            config,
            providers,
            service,
        }
    }

    pub fn add_host(
        &self,
        id: u32,
        uuid: &str,
        team_id: Option<u32>,
        platform: HostPlatform,
    ) -> SetupHost {
        let host = SetupHost::new(id, uuid, team_id, platform);
        self.providers.host_directory.add_host(host.clone());
        host
    }

    pub fn add_mac(&self, id: u32, uuid: &str) -> SetupHost {
        self.add_host(id, uuid, Some(1), HostPlatform::MacOs)
    }

    /// Insert rows, registering any VPP apps and scripts they refer to
    pub fn add_steps(&self, steps: impl IntoIterator<Item = SetupExperienceStep>) {
        for step in steps {
            match step.kind() {
                Ok(StepKind::VppApp { vpp_app_team_id }) => {
                    self.providers.vpp_installer.add_app(VppAppMetadata {
                        vpp_app_team_id,
                        adam_id: format!("adam-{vpp_app_team_id}"),
                        platform: "darwin".to_string(),
                        name: step.name.clone(),
                        self_service: false,
                    })
                }
                Ok(StepKind::Script { script_id }) => {
                    self.providers.script_runner.add_script(SetupScript {
                        id: script_id,
                        team_id: Some(1),
                        name: step.name.clone(),
                        contents: "#!/bin/sh\necho configured\n".to_string(),
                    })
                }
                _ => {}
            }
            self.providers.step_store.insert_step(step);
        }
    }

    pub fn status(&self, host_uuid: &str, step_id: u32) -> Option<SetupStepStatus> {
        self.providers
            .step_store
            .step(host_uuid, step_id)
            .map(|step| step.status)
    }

    pub fn execution_id(&self, host_uuid: &str, step_id: u32) -> Option<String> {
        self.providers
            .step_store
            .step(host_uuid, step_id)
            .and_then(|step| step.execution_id)
    }
}

impl Default for SetupExperienceHarness {
    fn default() -> Self {
        Self::new()
    }
}
