//! Handlers for the `/runs/{runUuid}/jobs` resource.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use trainhub_db::models::job::JobDetail;
use trainhub_db::repositories::{JobRepo, RunRepo};
use uuid::Uuid;

use crate::error::{not_found, AppResult};
use crate::handlers::PollQuery;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /runs/{runUuid}/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    Path(run_uuid): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    RunRepo::find_by_id(&state.pool, run_uuid)
        .await?
        .ok_or_else(|| not_found("Run", run_uuid))?;

    let jobs = JobRepo::list_for_run(&state.pool, run_uuid).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// Load a job detail, requiring it to belong to the given run.
async fn find_in_run(
    pool: &trainhub_db::DbPool,
    run_uuid: Uuid,
    job_uuid: Uuid,
) -> AppResult<JobDetail> {
    let detail = JobRepo::detail(pool, job_uuid)
        .await?
        .ok_or_else(|| not_found("Job", job_uuid))?;
    if detail.summary.run_uuid != run_uuid {
        return Err(not_found("Job", job_uuid));
    }
    Ok(detail)
}

/// GET /runs/{runUuid}/jobs/{jobUuid}?after=v
///
/// Read a job with its event history. With `after`, long-polls until
/// the job version exceeds it; on timeout the current state is returned
/// with 200.
pub async fn get_job(
    State(state): State<AppState>,
    Path((run_uuid, job_uuid)): Path<(Uuid, Uuid)>,
    Query(query): Query<PollQuery>,
) -> AppResult<Json<DataResponse<JobDetail>>> {
    let detail = find_in_run(&state.pool, run_uuid, job_uuid).await?;

    let Some(after) = query.after else {
        return Ok(Json(DataResponse { data: detail }));
    };
    if detail.summary.version > after {
        return Ok(Json(DataResponse { data: detail }));
    }

    // Register-then-recheck, same as the run poll.
    let poll_timeout = Duration::from_millis(state.config.poll_timeout_ms);
    let rx = state
        .job_registry
        .subscribe(job_uuid, after, poll_timeout)
        .await;
    let recheck = find_in_run(&state.pool, run_uuid, job_uuid).await?;
    if recheck.summary.version > after {
        return Ok(Json(DataResponse { data: recheck }));
    }

    match tokio::time::timeout(poll_timeout, rx).await {
        Ok(Ok(resolved)) => Ok(Json(DataResponse { data: resolved })),
        _ => {
            let current = find_in_run(&state.pool, run_uuid, job_uuid).await?;
            Ok(Json(DataResponse { data: current }))
        }
    }
}
