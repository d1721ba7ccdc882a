//! Configuration Tests
//!
//! Loads the shipped configuration directory and checks that loaded settings reach
//! the release decision.

mod common;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use common::SetupExperienceHarness;
use setup_experience::config::{ConfigManager, ConfigurationError};
use setup_experience::models::HostPlatform;
use setup_experience::ReleaseDecision;
use tempfile::TempDir;

fn shipped_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

#[test]
fn shipped_configuration_is_valid_for_every_environment() {
    for environment in ["development", "test", "production"] {
        let manager = ConfigManager::load_with_overrides(
            Some(shipped_config_dir()),
            environment,
            HashMap::new(),
        )
        .unwrap_or_else(|e| panic!("{environment} configuration failed to load: {e}"));

        assert_eq!(manager.environment(), environment);
        assert!(manager.config().validate().is_ok());
    }
}

#[test]
fn shipped_environment_files_override_base() {
    let test = ConfigManager::load_with_overrides(Some(shipped_config_dir()), "test", HashMap::new())
        .unwrap();
    assert_eq!(test.config().setup_experience.stuck_step_threshold(), None);
    assert!(!test.config().telemetry.metrics_enabled);

    let production =
        ConfigManager::load_with_overrides(Some(shipped_config_dir()), "production", HashMap::new())
            .unwrap();
    assert!(production.config().logging.json);
    assert_eq!(production.config().logging.level.as_deref(), Some("info"));
    assert_eq!(
        production.config().setup_experience.stuck_step_warning_seconds,
        3600
    );
}

#[test]
fn environment_variables_take_precedence() {
    let overrides = HashMap::from([
        (
            "SETUP_EXPERIENCE_RELEASE__MANUAL_RELEASE_DEFAULT".to_string(),
            "true".to_string(),
        ),
        (
            "SETUP_EXPERIENCE_SETUP_EXPERIENCE__STUCK_STEP_WARNING_SECONDS".to_string(),
            "120".to_string(),
        ),
    ]);

    let manager =
        ConfigManager::load_with_overrides(Some(shipped_config_dir()), "production", overrides)
            .unwrap();

    assert!(manager.config().release.manual_release_default);
    assert_eq!(
        manager.config().setup_experience.stuck_step_warning_seconds,
        120
    );
}

#[test]
fn invalid_team_override_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("setup-experience.toml"),
        r#"
[release.team_overrides]
engineering = true
"#,
    )
    .unwrap();

    let err = ConfigManager::load_with_overrides(
        Some(temp_dir.path().to_path_buf()),
        "test",
        HashMap::new(),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
    assert!(err.to_string().contains("release.team_overrides"));
}

#[test]
fn malformed_toml_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("setup-experience.test.toml"),
        "[release\nmanual_release_default = ",
    )
    .unwrap();

    let result = ConfigManager::load_with_overrides(
        Some(temp_dir.path().to_path_buf()),
        "test",
        HashMap::new(),
    );

    assert!(result.is_err());
}

#[tokio::test]
async fn team_overrides_from_file_drive_release() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("setup-experience.toml"),
        r#"
[release]
manual_release_default = true

[release.team_overrides]
"7" = false
"#,
    )
    .unwrap();
    let manager = ConfigManager::load_with_overrides(
        Some(temp_dir.path().to_path_buf()),
        "test",
        HashMap::new(),
    )
    .unwrap();

    let harness = SetupExperienceHarness::with_config(manager.config().clone());
    harness.add_host(1, "team-7-host", Some(7), HostPlatform::MacOs);
    harness.add_host(2, "team-8-host", Some(8), HostPlatform::IpadOs);
    harness.add_host(3, "no-team-host", None, HostPlatform::Ios);

    let team_7 = harness
        .service
        .check_and_release("team-7-host", false)
        .await
        .unwrap();
    let team_8 = harness
        .service
        .check_and_release("team-8-host", false)
        .await
        .unwrap();
    let no_team = harness
        .service
        .check_and_release("no-team-host", false)
        .await
        .unwrap();

    assert_eq!(team_7.decision, ReleaseDecision::Released);
    assert_eq!(team_8.decision, ReleaseDecision::ManualReleaseRequired);
    assert_eq!(no_team.decision, ReleaseDecision::ManualReleaseRequired);
    assert_eq!(
        harness.providers.mdm_commander.released_hosts(),
        vec!["team-7-host".to_string()]
    );
}
