//! Job entity model and DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use trainhub_core::status::JobStatus;
use trainhub_core::Version;
use uuid::Uuid;

use super::job_event::JobEvent;

/// A row from the `jobs` table.
///
/// Deliberately not `Serialize`: the callback `secret` must never leave
/// the coordinator. Client-facing representations are [`JobSummary`]
/// and [`JobDetail`].
#[derive(Debug, Clone, FromRow)]
pub struct Job {
    pub uuid: Uuid,
    pub run_uuid: Uuid,
    pub target_uuid: Uuid,
    /// Station-assigned identifier, bound by the first callback that
    /// presents one and immutable afterwards.
    pub remote_id: Option<String>,
    pub secret: String,
    pub status: JobStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Job summary embedded in run detail and job listings. Joined with the
/// job's target station.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub uuid: Uuid,
    pub run_uuid: Uuid,
    pub remote_id: Option<String>,
    pub status: JobStatus,
    pub station_name: String,
    pub station_uri: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub version: Version,
}

/// Full job representation served to clients and resolved to long-poll
/// waiters: the summary plus the job's event history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    #[serde(flatten)]
    pub summary: JobSummary,
    pub events: Vec<JobEvent>,
}

/// Snapshot handed to the dispatch client when a run is claimed.
///
/// Captured inside the claiming transaction, so `status` reflects the
/// job as-of claim time (PREPARED) even though a RUNNING event is
/// recorded before the outbound POST goes out.
#[derive(Debug, Clone, FromRow)]
pub struct DispatchJob {
    pub uuid: Uuid,
    pub run_uuid: Uuid,
    pub secret: String,
    pub status: JobStatus,
    pub station_uri: String,
    pub train_uri: String,
}
