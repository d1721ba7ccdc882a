pub mod content;
pub mod host;
pub mod release_status;
pub mod setup_step;

// Re-export core models for easy access
pub use content::{ScriptRequest, SetupScript, VppAppMetadata};
pub use host::{HostPlatform, SetupHost};
pub use release_status::{
    BootstrapPackageStatus, MdmCommandStatus, ProfileDeliveryStatus, ProfileStatusEntry,
    ReleaseStatusPayload, StepResult,
};
pub use setup_step::{SetupExperienceStep, StepCategory, StepKind};
