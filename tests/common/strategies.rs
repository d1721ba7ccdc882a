#![allow(dead_code)]

use proptest::prelude::*;
use setup_experience::models::{
    BootstrapPackageStatus, MdmCommandStatus, ProfileDeliveryStatus, ProfileStatusEntry,
    ReleaseStatusPayload, SetupExperienceStep, StepKind, StepResult,
};
use setup_experience::state_machine::SetupStepStatus;

pub const HOST_UUID: &str = "prop-host";

pub fn step_kind_strategy() -> impl Strategy<Value = StepKind> {
    prop_oneof![
        (1u32..50).prop_map(|installer_id| StepKind::SoftwareInstaller { installer_id }),
        (1u32..50).prop_map(|vpp_app_team_id| StepKind::VppApp { vpp_app_team_id }),
        (1u32..50).prop_map(|script_id| StepKind::Script { script_id }),
    ]
}

pub fn step_status_strategy() -> impl Strategy<Value = SetupStepStatus> {
    prop_oneof![
        Just(SetupStepStatus::Pending),
        Just(SetupStepStatus::Running),
        Just(SetupStepStatus::Success),
        Just(SetupStepStatus::Failure),
    ]
}

pub fn terminal_status_strategy() -> impl Strategy<Value = SetupStepStatus> {
    prop_oneof![Just(SetupStepStatus::Success), Just(SetupStepStatus::Failure)]
}

fn build_steps(specs: Vec<(StepKind, SetupStepStatus)>) -> Vec<SetupExperienceStep> {
    specs
        .into_iter()
        .enumerate()
        .map(|(index, (kind, status))| {
            let id = index as u32 + 1;
            let mut step = SetupExperienceStep::pending(id, HOST_UUID, format!("step-{id}"), kind);
            step.status = status;
            if status != SetupStepStatus::Pending {
                step.execution_id = Some(format!("exec-{id}"));
            }
            step
        })
        .collect()
}

/// Well-formed rows for one host with unique ids
pub fn host_steps_strategy() -> impl Strategy<Value = Vec<SetupExperienceStep>> {
    prop::collection::vec((step_kind_strategy(), step_status_strategy()), 0..12)
        .prop_map(build_steps)
}

/// Rows that have all reached Success or Failure
pub fn finished_steps_strategy() -> impl Strategy<Value = Vec<SetupExperienceStep>> {
    prop::collection::vec((step_kind_strategy(), terminal_status_strategy()), 0..12)
        .prop_map(build_steps)
}

fn step_result_strategy(status: impl Strategy<Value = SetupStepStatus>) -> impl Strategy<Value = StepResult> {
    ("[a-z]{3,10}", status).prop_map(|(name, status)| StepResult::new(name, status))
}

/// Payloads in which every item has reached a terminal status
pub fn terminal_payload_strategy() -> impl Strategy<Value = ReleaseStatusPayload> {
    (
        prop::option::of(prop_oneof![
            Just(BootstrapPackageStatus::Installed),
            Just(BootstrapPackageStatus::Failed),
        ]),
        prop::option::of(prop_oneof![
            Just(MdmCommandStatus::Acknowledged),
            Just(MdmCommandStatus::Error),
            Just(MdmCommandStatus::CommandFormatError),
        ]),
        prop::collection::vec(
            (
                "[A-Za-z]{3,12}",
                prop_oneof![
                    Just(ProfileDeliveryStatus::Verifying),
                    Just(ProfileDeliveryStatus::Verified),
                    Just(ProfileDeliveryStatus::Failed),
                ],
            )
                .prop_map(|(name, status)| ProfileStatusEntry::new(name, status)),
            0..6,
        ),
        prop::collection::vec(step_result_strategy(terminal_status_strategy()), 0..6),
        prop::option::of(step_result_strategy(terminal_status_strategy())),
    )
        .prop_map(
            |(bootstrap_package, account_configuration, configuration_profiles, software, script)| {
                ReleaseStatusPayload {
                    bootstrap_package,
                    account_configuration,
                    configuration_profiles,
                    software,
                    script,
                }
            },
        )
}
