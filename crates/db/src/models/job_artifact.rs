//! JobArtifact entity model and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use trainhub_core::status::ArtifactStorage;
use uuid::Uuid;

/// A row from the `job_artifacts` table, without the payload bytes.
/// The payload is fetched separately for downloads.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobArtifact {
    pub uuid: Uuid,
    pub job_uuid: Uuid,
    pub display_name: String,
    pub filename: String,
    pub bytesize: i64,
    /// Hex-encoded SHA-256 of the payload, verified at ingestion.
    pub hash: String,
    pub content_type: String,
    pub storage: ArtifactStorage,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// DTO for the inbound artifact callback
/// `POST /runs/{runUuid}/jobs/{jobUuid}/artifacts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobArtifact {
    pub secret: String,
    pub remote_id: Option<String>,
    pub display_name: String,
    pub filename: String,
    /// Declared payload size; must match the decoded bytes exactly.
    pub bytesize: i64,
    /// Declared hex SHA-256; must match the decoded bytes exactly.
    pub hash: String,
    pub content_type: String,
    pub occurred_at: DateTime<Utc>,
    /// Artifact payload, base64-encoded.
    pub base64data: String,
}
