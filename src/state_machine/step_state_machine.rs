use super::{
    errors::{StateMachineError, StateMachineResult},
    events::StepEvent,
    states::SetupStepStatus,
};
use crate::models::SetupExperienceStep;
use chrono::Utc;

/// Lifecycle rules for a single setup experience step
///
/// Transitions are applied to the in-memory row only. Persisting the row is the
/// caller's job, so the engine can write each Running row before enqueueing the next.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetupStepStateMachine;

impl SetupStepStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Apply `event` to `step`, returning the new status
    pub fn transition(
        &self,
        step: &mut SetupExperienceStep,
        event: StepEvent,
    ) -> StateMachineResult<SetupStepStatus> {
        let target = self.determine_target_state(step.id, step.status, &event)?;

        match event {
            StepEvent::Start { execution_id } => {
                if execution_id.is_empty() {
                    return Err(StateMachineError::MissingExecutionId { step_id: step.id });
                }
                step.execution_id = Some(execution_id);
                step.error = None;
            }
            StepEvent::Succeed => {
                step.error = None;
            }
            StepEvent::Fail(error) => {
                step.error = Some(error);
            }
        }

        step.status = target;
        step.updated_at = Utc::now();
        Ok(target)
    }

    /// Determine the target state based on current state and event
    pub fn determine_target_state(
        &self,
        step_id: u32,
        current_state: SetupStepStatus,
        event: &StepEvent,
    ) -> StateMachineResult<SetupStepStatus> {
        let target = match (current_state, event) {
            (SetupStepStatus::Pending, StepEvent::Start { .. }) => SetupStepStatus::Running,

            (SetupStepStatus::Running, StepEvent::Succeed) => SetupStepStatus::Success,

            // Pending -> Failure covers content that was removed before it could run
            (SetupStepStatus::Running, StepEvent::Fail(_)) => SetupStepStatus::Failure,
            (SetupStepStatus::Pending, StepEvent::Fail(_)) => SetupStepStatus::Failure,

            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    step_id,
                    from: from_state.to_string(),
                    event: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepKind;

    fn pending_installer() -> SetupExperienceStep {
        SetupExperienceStep::pending(
            1,
            "host-1",
            "Firefox",
            StepKind::SoftwareInstaller { installer_id: 5 },
        )
    }

    #[test]
    fn test_start_captures_execution_id() {
        let machine = SetupStepStateMachine::new();
        let mut step = pending_installer();

        let status = machine
            .transition(&mut step, StepEvent::start("exec-123"))
            .unwrap();

        assert_eq!(status, SetupStepStatus::Running);
        assert_eq!(step.status, SetupStepStatus::Running);
        assert_eq!(step.execution_id.as_deref(), Some("exec-123"));
        assert!(step.validate().is_ok());
    }

    #[test]
    fn test_start_requires_non_empty_execution_id() {
        let machine = SetupStepStateMachine::new();
        let mut step = pending_installer();

        let err = machine
            .transition(&mut step, StepEvent::start(""))
            .unwrap_err();

        assert_eq!(err, StateMachineError::MissingExecutionId { step_id: 1 });
        assert_eq!(step.status, SetupStepStatus::Pending);
        assert!(step.execution_id.is_none());
    }

    #[test]
    fn test_completion_transitions() {
        let machine = SetupStepStateMachine::new();

        let mut step = pending_installer();
        machine.transition(&mut step, StepEvent::start("a")).unwrap();
        machine.transition(&mut step, StepEvent::Succeed).unwrap();
        assert_eq!(step.status, SetupStepStatus::Success);
        assert_eq!(step.execution_id.as_deref(), Some("a"));

        let mut step = pending_installer();
        machine.transition(&mut step, StepEvent::start("b")).unwrap();
        machine
            .transition(&mut step, StepEvent::fail_with_error("exit code 1"))
            .unwrap();
        assert_eq!(step.status, SetupStepStatus::Failure);
        assert_eq!(step.error.as_deref(), Some("exit code 1"));
    }

    #[test]
    fn test_pending_can_fail_directly() {
        let machine = SetupStepStateMachine::new();
        let mut step = pending_installer();

        let status = machine
            .transition(&mut step, StepEvent::fail_with_error("installer deleted"))
            .unwrap();
        assert_eq!(status, SetupStepStatus::Failure);
    }

    #[test]
    fn test_invalid_transitions() {
        let machine = SetupStepStateMachine::new();

        assert!(machine
            .determine_target_state(1, SetupStepStatus::Pending, &StepEvent::Succeed)
            .is_err());
        assert!(machine
            .determine_target_state(1, SetupStepStatus::Running, &StepEvent::start("x"))
            .is_err());
        assert!(machine
            .determine_target_state(1, SetupStepStatus::Success, &StepEvent::fail_with_error("x"))
            .is_err());

        let err = machine
            .determine_target_state(9, SetupStepStatus::Failure, &StepEvent::Succeed)
            .unwrap_err();
        assert_eq!(
            err,
            StateMachineError::InvalidTransition {
                step_id: 9,
                from: "failure".to_string(),
                event: "succeed".to_string(),
            }
        );
    }
}
