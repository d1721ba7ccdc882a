//! # Step Classifier
//!
//! Pure partitioning of a host's rows into per-category pending lists and running
//! counts. The next-step engine decides everything from this view.

use serde::Serialize;
use tracing::debug;

use crate::error::SetupResult;
use crate::models::{SetupExperienceStep, StepCategory};
use crate::state_machine::SetupStepStatus;

/// Pending rows and running count for one category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryState {
    /// Rows still waiting to be enqueued, in store order
    pub pending: Vec<SetupExperienceStep>,
    pub running: usize,
}

impl CategoryState {
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn has_running(&self) -> bool {
        self.running > 0
    }

    /// Work in this category is not finished yet
    pub fn is_outstanding(&self) -> bool {
        self.has_pending() || self.has_running()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedSteps {
    pub installers: CategoryState,
    pub vpp_apps: CategoryState,
    pub scripts: CategoryState,
}

impl ClassifiedSteps {
    pub fn category(&self, category: StepCategory) -> &CategoryState {
        match category {
            StepCategory::SoftwareInstaller => &self.installers,
            StepCategory::VppApp => &self.vpp_apps,
            StepCategory::Script => &self.scripts,
        }
    }

    fn category_mut(&mut self, category: StepCategory) -> &mut CategoryState {
        match category {
            StepCategory::SoftwareInstaller => &mut self.installers,
            StepCategory::VppApp => &mut self.vpp_apps,
            StepCategory::Script => &mut self.scripts,
        }
    }

    pub fn total_running(&self) -> usize {
        self.installers.running + self.vpp_apps.running + self.scripts.running
    }

    pub fn total_pending(&self) -> usize {
        self.installers.pending.len() + self.vpp_apps.pending.len() + self.scripts.pending.len()
    }

    /// Whether any category ahead of `category` still has pending or running rows
    pub fn blocked_by_earlier_category(&self, category: StepCategory) -> bool {
        StepCategory::ALL
            .iter()
            .filter(|earlier| **earlier < category)
            .any(|earlier| self.category(*earlier).is_outstanding())
    }
}

/// Partition a host's rows by category and status
///
/// Any malformed row fails the whole classification with
/// [`SetupError::InvalidRow`](crate::error::SetupError::InvalidRow).
pub fn classify(host_uuid: &str, steps: &[SetupExperienceStep]) -> SetupResult<ClassifiedSteps> {
    let mut classified = ClassifiedSteps::default();

    for step in steps {
        let category = step.validate()?.category();
        let state = classified.category_mut(category);

        match step.status {
            SetupStepStatus::Pending => state.pending.push(step.clone()),
            SetupStepStatus::Running => state.running += 1,
            SetupStepStatus::Success | SetupStepStatus::Failure => {}
        }
    }

    debug!(
        host_uuid = %host_uuid,
        pending_installers = classified.installers.pending.len(),
        running_installers = classified.installers.running,
        pending_vpp_apps = classified.vpp_apps.pending.len(),
        running_vpp_apps = classified.vpp_apps.running,
        pending_scripts = classified.scripts.pending.len(),
        running_scripts = classified.scripts.running,
        "Classified setup experience steps"
    );

    Ok(classified)
}
