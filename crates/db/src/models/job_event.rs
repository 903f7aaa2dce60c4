//! JobEvent entity model and DTOs. Events are append-only facts; rows
//! are never updated or deleted once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use trainhub_core::status::{JobEventType, JobStatus};
use uuid::Uuid;

/// A row from the `job_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub uuid: Uuid,
    /// Ingestion sequence; tiebreaker for events with equal
    /// `occurred_at`. Not exposed to clients.
    #[serde(skip)]
    pub seq: i64,
    pub job_uuid: Uuid,
    #[serde(rename = "type")]
    pub event_type: JobEventType,
    pub result_status: Option<JobStatus>,
    pub message: String,
    pub payload: Option<serde_json::Value>,
    /// Station-reported time of the event. Caller-supplied and not
    /// validated against ingestion time.
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// DTO for the inbound event callback
/// `POST /runs/{runUuid}/jobs/{jobUuid}/events`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobEvent {
    pub secret: String,
    pub remote_id: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: JobEventType,
    pub message: String,
    pub payload: Option<serde_json::Value>,
    /// When present, the job transitions to this status and the run
    /// status is re-derived from all of its jobs.
    pub result_status: Option<JobStatus>,
    pub occurred_at: DateTime<Utc>,
}
