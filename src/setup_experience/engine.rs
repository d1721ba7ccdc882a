//! # Next-Step Decision Engine
//!
//! Advances a host's setup experience by one category at a time. On every call the
//! engine reads the host's rows, classifies them and takes exactly one branch:
//!
//! 1. Pending software installers: enqueue all of them
//! 2. No installers running and pending VPP apps: enqueue all of them
//! 3. No installers or VPP apps running and pending scripts: enqueue all of them
//! 4. Nothing running: the sequence is finished
//! 5. Otherwise: wait for running work to complete
//!
//! Each row is persisted as Running right after its work is enqueued and before the
//! next row is touched. The write only lands while the stored row is still Pending, so
//! an overlapping check-in never moves a row backwards. The first failure aborts the
//! call; rows already advanced stay Running with their execution ids and are not
//! re-enqueued by later calls.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::error::{SetupError, SetupResult};
use crate::logging::log_step_operation;
use crate::metrics;
use crate::models::{ScriptRequest, SetupExperienceStep, SetupHost, StepCategory, StepKind};
use crate::setup_experience::classifier::{classify, ClassifiedSteps};
use crate::setup_experience::staleness::report_stale_steps;
use crate::setup_experience::traits::{
    HostDirectory, ScriptRunner, SetupStepStore, SoftwareInstallQueue, VppInstaller,
};
use crate::state_machine::{SetupStepStateMachine, StepEvent};

pub struct NextStepEngine {
    store: Arc<dyn SetupStepStore>,
    install_queue: Arc<dyn SoftwareInstallQueue>,
    vpp_installer: Arc<dyn VppInstaller>,
    script_runner: Arc<dyn ScriptRunner>,
    hosts: Arc<dyn HostDirectory>,
    state_machine: SetupStepStateMachine,
    stuck_step_threshold: Option<Duration>,
}

impl std::fmt::Debug for NextStepEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextStepEngine")
            .field("stuck_step_threshold", &self.stuck_step_threshold)
            .finish_non_exhaustive()
    }
}

impl NextStepEngine {
    pub fn new(
        store: Arc<dyn SetupStepStore>,
        install_queue: Arc<dyn SoftwareInstallQueue>,
        vpp_installer: Arc<dyn VppInstaller>,
        script_runner: Arc<dyn ScriptRunner>,
        hosts: Arc<dyn HostDirectory>,
    ) -> Self {
        Self {
            store,
            install_queue,
            vpp_installer,
            script_runner,
            hosts,
            state_machine: SetupStepStateMachine::new(),
            stuck_step_threshold: None,
        }
    }

    /// Warn about Running steps older than `threshold` while waiting on them
    pub fn with_stuck_step_threshold(mut self, threshold: Option<Duration>) -> Self {
        self.stuck_step_threshold = threshold;
        self
    }

    /// Advance the host's setup experience, returning `true` once it is finished
    #[instrument(skip_all, fields(host_uuid = %host_uuid))]
    pub async fn advance(&self, host_uuid: &str) -> SetupResult<bool> {
        let host = self
            .hosts
            .host_by_uuid(host_uuid)
            .await
            .map_err(|e| {
                error!(host_uuid = %host_uuid, error = %e, "Failed to look up host");
                e.wrap(format!("look up host {host_uuid}"))
            })?
            .ok_or_else(|| SetupError::not_found("host", host_uuid))?;

        self.advance_host(&host).await
    }

    /// Advance an already resolved host
    pub async fn advance_host(&self, host: &SetupHost) -> SetupResult<bool> {
        let steps = self.store.list_steps(&host.uuid).await.map_err(|e| {
            error!(host_uuid = %host.uuid, error = %e, "Failed to list setup experience steps");
            e.wrap(format!("list setup experience steps for host {}", host.uuid))
        })?;

        let classified = classify(&host.uuid, &steps)?;

        if let Some(category) = Self::next_category(&classified) {
            let pending = &classified.category(category).pending;
            info!(
                host_uuid = %host.uuid,
                category = %category,
                count = pending.len(),
                "Starting setup experience steps"
            );

            for step in pending {
                self.start_step(host, step.clone()).await?;
            }
            return Ok(false);
        }

        if classified.total_running() == 0 {
            debug!(host_uuid = %host.uuid, "Setup experience finished");
            return Ok(true);
        }

        debug!(
            host_uuid = %host.uuid,
            running = classified.total_running(),
            "Waiting on running setup experience steps"
        );
        if let Some(threshold) = self.stuck_step_threshold {
            report_stale_steps(&host.uuid, &steps, threshold);
        }

        Ok(false)
    }

    /// The single category to enqueue on this call, if any
    ///
    /// A category is eligible when it has pending rows and no earlier category has
    /// pending or running rows.
    pub fn next_category(classified: &ClassifiedSteps) -> Option<StepCategory> {
        StepCategory::ALL.into_iter().find(|category| {
            classified.category(*category).has_pending()
                && !classified.blocked_by_earlier_category(*category)
        })
    }

    async fn start_step(&self, host: &SetupHost, mut step: SetupExperienceStep) -> SetupResult<()> {
        let kind = step.validate()?;
        let category = kind.category();

        let execution_id = match self.enqueue(host, &step, kind).await {
            Ok(execution_id) => execution_id,
            Err(e) => {
                metrics::record_enqueue_failure(category);
                error!(
                    host_uuid = %host.uuid,
                    step_id = step.id,
                    category = %category,
                    error = %e,
                    "Failed to enqueue setup experience step"
                );
                return Err(e.wrap(format!("enqueue {category} step {}", step.id)));
            }
        };

        self.state_machine
            .transition(&mut step, StepEvent::start(execution_id))?;

        let applied = match self.store.update_step(&step).await {
            Ok(applied) => applied,
            Err(e) => {
                metrics::record_enqueue_failure(category);
                error!(
                    host_uuid = %host.uuid,
                    step_id = step.id,
                    category = %category,
                    execution_id = step.execution_id.as_deref(),
                    error = %e,
                    "Failed to persist running setup experience step"
                );
                return Err(e.wrap(format!("persist {category} step {}", step.id)));
            }
        };

        if !applied {
            warn!(
                host_uuid = %host.uuid,
                step_id = step.id,
                category = %category,
                execution_id = step.execution_id.as_deref(),
                "Setup experience step already advanced by another check-in, keeping stored state"
            );
            return Ok(());
        }

        metrics::record_step_started(category);
        log_step_operation(
            "start",
            &host.uuid,
            step.id,
            category.as_str(),
            step.execution_id.as_deref(),
            &step.status.to_string(),
        );

        Ok(())
    }

    async fn enqueue(
        &self,
        host: &SetupHost,
        step: &SetupExperienceStep,
        kind: StepKind,
    ) -> SetupResult<String> {
        match kind {
            StepKind::SoftwareInstaller { installer_id } => {
                self.install_queue.enqueue_install(host.id, installer_id).await
            }
            StepKind::VppApp { vpp_app_team_id } => {
                let app = self
                    .vpp_installer
                    .vpp_app_metadata(host.team_id, vpp_app_team_id)
                    .await
                    .map_err(|e| e.wrap(format!("resolve vpp app for step {}", step.id)))?;
                self.vpp_installer.enqueue_vpp_install(host, &app).await
            }
            StepKind::Script { script_id } => {
                let script = self
                    .script_runner
                    .setup_script(script_id)
                    .await
                    .map_err(|e| e.wrap(format!("resolve setup script for step {}", step.id)))?;
                let request = ScriptRequest::for_host(host.id, &script);
                self.script_runner.enqueue_script(host.id, &request).await
            }
        }
    }
}
