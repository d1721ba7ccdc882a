//! # Stuck Step Diagnostics
//!
//! Running steps are never timed out: their terminal status is written by whichever
//! pathway observes the install or script result. When the engine finds a host with
//! nothing to enqueue and work still running, it reports rows that have been Running
//! longer than the configured threshold so operators can investigate.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

use crate::models::SetupExperienceStep;

/// A Running step that has not changed status within the threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleStep {
    pub step_id: u32,
    pub name: String,
    pub execution_id: Option<String>,
    pub running_seconds: u64,
}

/// Running rows whose `updated_at` is older than `threshold` at `now`
pub fn stale_running_steps(
    steps: &[SetupExperienceStep],
    threshold: Duration,
    now: DateTime<Utc>,
) -> Vec<StaleStep> {
    steps
        .iter()
        .filter(|step| step.status.is_active())
        .filter_map(|step| {
            let elapsed = now.signed_duration_since(step.updated_at).to_std().ok()?;
            (elapsed > threshold).then(|| StaleStep {
                step_id: step.id,
                name: step.name.clone(),
                execution_id: step.execution_id.clone(),
                running_seconds: elapsed.as_secs(),
            })
        })
        .collect()
}

/// Warn about every stale step on the host, returning how many were found
pub fn report_stale_steps(
    host_uuid: &str,
    steps: &[SetupExperienceStep],
    threshold: Duration,
) -> usize {
    let stale = stale_running_steps(steps, threshold, Utc::now());

    for step in &stale {
        warn!(
            host_uuid = %host_uuid,
            step_id = step.step_id,
            step_name = %step.name,
            execution_id = step.execution_id.as_deref(),
            running_seconds = step.running_seconds,
            threshold_seconds = threshold.as_secs(),
            "Setup experience step has been running longer than expected"
        );
    }

    stale.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepKind;
    use crate::state_machine::SetupStepStatus;

    fn running_since(id: u32, updated_at: DateTime<Utc>) -> SetupExperienceStep {
        let mut step =
            SetupExperienceStep::pending(id, "host-1", "setup.sh", StepKind::Script { script_id: id });
        step.status = SetupStepStatus::Running;
        step.execution_id = Some(format!("exec-{id}"));
        step.updated_at = updated_at;
        step
    }

    #[test]
    fn test_only_old_running_steps_are_stale() {
        let now = Utc::now();
        let mut finished = running_since(3, now - chrono::Duration::hours(5));
        finished.status = SetupStepStatus::Success;

        let steps = vec![
            running_since(1, now - chrono::Duration::hours(2)),
            running_since(2, now - chrono::Duration::minutes(5)),
            finished,
        ];

        let stale = stale_running_steps(&steps, Duration::from_secs(3600), now);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].step_id, 1);
        assert_eq!(stale[0].execution_id.as_deref(), Some("exec-1"));
        assert!(stale[0].running_seconds >= 7200);
    }

    #[test]
    fn test_future_timestamps_are_ignored() {
        let now = Utc::now();
        let steps = vec![running_since(1, now + chrono::Duration::minutes(1))];
        assert!(stale_running_steps(&steps, Duration::from_secs(0), now).is_empty());
    }

    #[test]
    fn test_report_counts_stale_steps() {
        let steps = vec![running_since(1, Utc::now() - chrono::Duration::days(1))];
        assert_eq!(report_stale_steps("host-1", &steps, Duration::from_secs(60)), 1);
    }
}
