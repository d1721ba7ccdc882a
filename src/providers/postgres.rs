//! # PostgreSQL Step Store
//!
//! [`SetupStepStore`] over the existing `setup_experience_status_results` table. The
//! table keeps one execution id column per kind of work; this store maps them onto
//! the single `execution_id` of [`SetupExperienceStep`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::error::{SetupError, SetupResult};
use crate::models::{SetupExperienceStep, StepKind};
use crate::setup_experience::traits::SetupStepStore;
use crate::state_machine::SetupStepStatus;

const SELECT_STEPS_SQL: &str = r#"
    SELECT id, host_uuid, name, status,
           software_installer_id, vpp_app_team_id, setup_experience_script_id,
           host_software_installs_execution_id, nano_command_uuid, script_execution_id,
           error, updated_at
    FROM setup_experience_status_results
    WHERE host_uuid = $1
    ORDER BY id ASC
"#;

const UPDATE_STEP_SQL: &str = r#"
    UPDATE setup_experience_status_results
    SET status = $2,
        host_software_installs_execution_id = $3,
        nano_command_uuid = $4,
        script_execution_id = $5,
        error = $6,
        updated_at = $7
    WHERE id = $1
      AND ($2 <> 'running' OR status = 'pending')
"#;

/// Raw `setup_experience_status_results` row
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SetupStepRow {
    pub id: i32,
    pub host_uuid: String,
    pub name: String,
    pub status: String,
    pub software_installer_id: Option<i32>,
    pub vpp_app_team_id: Option<i32>,
    pub setup_experience_script_id: Option<i32>,
    pub host_software_installs_execution_id: Option<String>,
    pub nano_command_uuid: Option<String>,
    pub script_execution_id: Option<String>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

fn to_u32(host_uuid: &str, step_id: u32, column: &str, value: i32) -> SetupResult<u32> {
    u32::try_from(value).map_err(|_| {
        SetupError::invalid_row(host_uuid, step_id, format!("{column} is negative: {value}"))
    })
}

fn optional_u32(
    host_uuid: &str,
    step_id: u32,
    column: &str,
    value: Option<i32>,
) -> SetupResult<Option<u32>> {
    value
        .map(|v| to_u32(host_uuid, step_id, column, v))
        .transpose()
}

impl TryFrom<SetupStepRow> for SetupExperienceStep {
    type Error = SetupError;

    fn try_from(row: SetupStepRow) -> Result<Self, Self::Error> {
        let id = u32::try_from(row.id).map_err(|_| {
            SetupError::invalid_row(&row.host_uuid, 0, format!("negative row id {}", row.id))
        })?;
        let status = row
            .status
            .parse::<SetupStepStatus>()
            .map_err(|reason| SetupError::invalid_row(&row.host_uuid, id, reason))?;

        let mut step = SetupExperienceStep {
            id,
            software_installer_id: optional_u32(
                &row.host_uuid,
                id,
                "software_installer_id",
                row.software_installer_id,
            )?,
            vpp_app_team_id: optional_u32(&row.host_uuid, id, "vpp_app_team_id", row.vpp_app_team_id)?,
            setup_experience_script_id: optional_u32(
                &row.host_uuid,
                id,
                "setup_experience_script_id",
                row.setup_experience_script_id,
            )?,
            host_uuid: row.host_uuid,
            name: row.name,
            status,
            execution_id: None,
            error: row.error,
            updated_at: row.updated_at,
        };

        step.execution_id = match step.kind()? {
            StepKind::SoftwareInstaller { .. } => row.host_software_installs_execution_id,
            StepKind::VppApp { .. } => row.nano_command_uuid,
            StepKind::Script { .. } => row.script_execution_id,
        };

        Ok(step)
    }
}

/// Per-kind execution id columns for a step:
/// `(host_software_installs_execution_id, nano_command_uuid, script_execution_id)`
pub fn execution_columns(
    step: &SetupExperienceStep,
) -> SetupResult<(Option<String>, Option<String>, Option<String>)> {
    let execution_id = step.execution_id.clone();
    Ok(match step.kind()? {
        StepKind::SoftwareInstaller { .. } => (execution_id, None, None),
        StepKind::VppApp { .. } => (None, execution_id, None),
        StepKind::Script { .. } => (None, None, execution_id),
    })
}

#[derive(Debug, Clone)]
pub struct PgSetupStepStore {
    pool: PgPool,
}

impl PgSetupStepStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SetupStepStore for PgSetupStepStore {
    async fn list_steps(&self, host_uuid: &str) -> SetupResult<Vec<SetupExperienceStep>> {
        let rows = sqlx::query_as::<_, SetupStepRow>(SELECT_STEPS_SQL)
            .bind(host_uuid)
            .fetch_all(&self.pool)
            .await?;

        debug!(host_uuid = %host_uuid, rows = rows.len(), "Loaded setup experience rows");

        rows.into_iter().map(SetupExperienceStep::try_from).collect()
    }

    async fn update_step(&self, step: &SetupExperienceStep) -> SetupResult<bool> {
        let (install_execution_id, command_uuid, script_execution_id) = execution_columns(step)?;
        let id = i32::try_from(step.id).map_err(|_| {
            SetupError::invalid_row(&step.host_uuid, step.id, "row id exceeds column range")
        })?;

        let result = sqlx::query(UPDATE_STEP_SQL)
            .bind(id)
            .bind(step.status.to_string())
            .bind(install_execution_id)
            .bind(command_uuid)
            .bind(script_execution_id)
            .bind(step.error.as_deref())
            .bind(step.updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // A Running write loses to any check-in that already moved the row on
        if step.status == SetupStepStatus::Running {
            debug!(
                host_uuid = %step.host_uuid,
                step_id = step.id,
                "Setup experience row no longer pending, running write skipped"
            );
            return Ok(false);
        }

        Err(SetupError::not_found(
            "setup experience step",
            step.id.to_string(),
        ))
    }
}
