//! Run entity model and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use trainhub_core::status::RunStatus;
use trainhub_core::Version;
use uuid::Uuid;

use super::job::{DispatchJob, JobSummary};

/// A row from the `runs` table.
#[derive(Debug, Clone, FromRow)]
pub struct Run {
    pub uuid: Uuid,
    pub plan_uuid: Uuid,
    pub display_name: String,
    pub note: String,
    pub status: RunStatus,
    pub should_start_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Run representation served to clients and resolved to long-poll
/// waiters. Embeds a summary of every job of the run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDetail {
    pub uuid: Uuid,
    pub display_name: String,
    pub note: String,
    pub status: RunStatus,
    pub plan_uuid: Uuid,
    pub should_start_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub version: Version,
    pub jobs: Vec<JobSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunDetail {
    pub fn from_parts(run: Run, jobs: Vec<JobSummary>) -> Self {
        Self {
            uuid: run.uuid,
            display_name: run.display_name,
            note: run.note,
            status: run.status,
            plan_uuid: run.plan_uuid,
            should_start_at: run.should_start_at,
            started_at: run.started_at,
            finished_at: run.finished_at,
            version: run.version,
            jobs,
            created_at: run.created_at,
            updated_at: run.updated_at,
        }
    }
}

/// DTO for `POST /runs`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRun {
    pub plan_uuid: Uuid,
    pub display_name: String,
    #[serde(default)]
    pub note: String,
    /// When set, the run is created SCHEDULED and dispatched once this
    /// instant has passed; otherwise it is PREPARED and dispatched on
    /// the next tick.
    pub should_start_at: Option<DateTime<Utc>>,
}

/// DTO for `PUT /runs/{uuid}`. Display metadata only; status and
/// timestamps are owned by ingestion and the dispatcher.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRun {
    pub display_name: String,
    #[serde(default)]
    pub note: String,
}

/// A run claimed for dispatch: the updated run row plus a dispatch
/// snapshot of each of its jobs, taken in the claiming transaction.
#[derive(Debug)]
pub struct ClaimedRun {
    pub run: Run,
    pub jobs: Vec<DispatchJob>,
}
