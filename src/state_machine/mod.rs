// Step lifecycle for setup experience rows.
//
// Pending -> Running -> Success | Failure, with Pending -> Failure for steps that
// are abandoned before they start. Transitions are pure; persistence belongs to the
// step store.

pub mod errors;
pub mod events;
pub mod states;
pub mod step_state_machine;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::StepEvent;
pub use states::SetupStepStatus;
pub use step_state_machine::SetupStepStateMachine;
