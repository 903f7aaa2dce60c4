//! Handlers for job artifacts: the inbound upload callback, metadata
//! reads, and the raw download.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use trainhub_db::models::job_artifact::{CreateJobArtifact, JobArtifact};
use trainhub_db::repositories::{JobArtifactRepo, JobRepo};
use uuid::Uuid;

use crate::error::{not_found, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /runs/{runUuid}/jobs/{jobUuid}/artifacts
///
/// The artifact upload callback. Same secret rules as events; the
/// payload is verified against the declared size and hash before it is
/// stored.
pub async fn create_artifact(
    State(state): State<AppState>,
    Path((run_uuid, job_uuid)): Path<(Uuid, Uuid)>,
    Json(input): Json<CreateJobArtifact>,
) -> AppResult<impl IntoResponse> {
    let artifact = state
        .ingest
        .create_artifact(run_uuid, job_uuid, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: artifact })))
}

/// Verify the run/job path and load an artifact belonging to the job.
async fn find_in_job(
    pool: &trainhub_db::DbPool,
    run_uuid: Uuid,
    job_uuid: Uuid,
    artifact_uuid: Uuid,
) -> AppResult<JobArtifact> {
    let job = JobRepo::find_by_id(pool, job_uuid)
        .await?
        .ok_or_else(|| not_found("Job", job_uuid))?;
    if job.run_uuid != run_uuid {
        return Err(not_found("Job", job_uuid));
    }
    JobArtifactRepo::find_by_id(pool, artifact_uuid)
        .await?
        .filter(|a| a.job_uuid == job_uuid)
        .ok_or_else(|| not_found("JobArtifact", artifact_uuid))
}

/// GET /runs/{runUuid}/jobs/{jobUuid}/artifacts
pub async fn list_artifacts(
    State(state): State<AppState>,
    Path((run_uuid, job_uuid)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let job = JobRepo::find_by_id(&state.pool, job_uuid)
        .await?
        .ok_or_else(|| not_found("Job", job_uuid))?;
    if job.run_uuid != run_uuid {
        return Err(not_found("Job", job_uuid));
    }

    let artifacts = JobArtifactRepo::list_for_job(&state.pool, job_uuid).await?;
    Ok(Json(DataResponse { data: artifacts }))
}

/// GET /runs/{runUuid}/jobs/{jobUuid}/artifacts/{artifactUuid}
pub async fn get_artifact(
    State(state): State<AppState>,
    Path((run_uuid, job_uuid, artifact_uuid)): Path<(Uuid, Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let artifact = find_in_job(&state.pool, run_uuid, job_uuid, artifact_uuid).await?;
    Ok(Json(DataResponse { data: artifact }))
}

/// GET /runs/{runUuid}/jobs/{jobUuid}/artifacts/{artifactUuid}/download
///
/// Raw payload bytes with the stored content type.
pub async fn download_artifact(
    State(state): State<AppState>,
    Path((run_uuid, job_uuid, artifact_uuid)): Path<(Uuid, Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let artifact = find_in_job(&state.pool, run_uuid, job_uuid, artifact_uuid).await?;
    let data = JobArtifactRepo::data(&state.pool, artifact_uuid)
        .await?
        .ok_or_else(|| not_found("JobArtifact", artifact_uuid))?;

    let headers = [
        (header::CONTENT_TYPE, artifact.content_type),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.filename),
        ),
    ];
    Ok((headers, data))
}
