//! Handlers for the `/runs` resource.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use trainhub_core::status::RunStatus;
use trainhub_db::models::run::{CreateRun, RunDetail, UpdateRun};
use trainhub_db::repositories::{JobRepo, PlanRepo, RunRepo};
use uuid::Uuid;

use crate::error::{not_found, AppResult};
use crate::handlers::PollQuery;
use crate::response::DataResponse;
use crate::secrets::generate_secret;
use crate::state::AppState;

/// POST /runs
///
/// Create a run for a plan, plus one PREPARED job per plan target, each
/// with a fresh callback secret. A `shouldStartAt` makes the run
/// SCHEDULED; without one it is PREPARED and picked up on the next
/// dispatcher tick.
pub async fn create_run(
    State(state): State<AppState>,
    Json(input): Json<CreateRun>,
) -> AppResult<impl IntoResponse> {
    let plan = PlanRepo::find_by_id(&state.pool, input.plan_uuid)
        .await?
        .ok_or_else(|| not_found("Plan", input.plan_uuid))?;
    let targets = PlanRepo::targets(&state.pool, plan.uuid).await?;

    let status = match input.should_start_at {
        Some(_) => RunStatus::Scheduled,
        None => RunStatus::Prepared,
    };

    let mut tx = state.pool.begin().await?;
    let run = RunRepo::create(&mut tx, &input, status).await?;
    for target in &targets {
        JobRepo::create(&mut tx, run.uuid, target.uuid, &generate_secret()).await?;
    }
    tx.commit().await?;

    tracing::info!(
        run_id = %run.uuid,
        plan_id = %plan.uuid,
        jobs = targets.len(),
        status = ?status,
        "Run created",
    );

    let detail = RunRepo::detail(&state.pool, run.uuid)
        .await?
        .ok_or_else(|| not_found("Run", run.uuid))?;
    state.ingest.publish_run(run.uuid).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /runs/{uuid}?after=v
///
/// Read a run. With `after`, long-polls until the run version exceeds
/// it; on timeout the current state is returned with 200.
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_uuid): Path<Uuid>,
    Query(query): Query<PollQuery>,
) -> AppResult<Json<DataResponse<RunDetail>>> {
    let detail = RunRepo::detail(&state.pool, run_uuid)
        .await?
        .ok_or_else(|| not_found("Run", run_uuid))?;

    let Some(after) = query.after else {
        return Ok(Json(DataResponse { data: detail }));
    };
    if detail.version > after {
        return Ok(Json(DataResponse { data: detail }));
    }

    // Register, then re-read: an update landing between the first read
    // and the subscription is caught by the re-read, so nothing can
    // slip through unobserved.
    let poll_timeout = Duration::from_millis(state.config.poll_timeout_ms);
    let rx = state
        .run_registry
        .subscribe(run_uuid, after, poll_timeout)
        .await;
    let recheck = RunRepo::detail(&state.pool, run_uuid)
        .await?
        .ok_or_else(|| not_found("Run", run_uuid))?;
    if recheck.version > after {
        return Ok(Json(DataResponse { data: recheck }));
    }

    match tokio::time::timeout(poll_timeout, rx).await {
        Ok(Ok(resolved)) => Ok(Json(DataResponse { data: resolved })),
        // Timeout (or a swept waiter): answer with the best-known state.
        _ => {
            let current = RunRepo::detail(&state.pool, run_uuid)
                .await?
                .ok_or_else(|| not_found("Run", run_uuid))?;
            Ok(Json(DataResponse { data: current }))
        }
    }
}

/// PUT /runs/{uuid}
///
/// Update display metadata. Not status-affecting: the version stays put,
/// but the fresh representation is still announced to pollers.
pub async fn update_run(
    State(state): State<AppState>,
    Path(run_uuid): Path<Uuid>,
    Json(input): Json<UpdateRun>,
) -> AppResult<impl IntoResponse> {
    RunRepo::update_info(&state.pool, run_uuid, &input)
        .await?
        .ok_or_else(|| not_found("Run", run_uuid))?;

    let detail = RunRepo::detail(&state.pool, run_uuid)
        .await?
        .ok_or_else(|| not_found("Run", run_uuid))?;
    state.ingest.publish_run(run_uuid).await?;

    Ok(Json(DataResponse { data: detail }))
}

/// Query parameters for run listing.
#[derive(Debug, Deserialize)]
pub struct ListRunsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /plans/{planUuid}/runs
pub async fn list_runs_for_plan(
    State(state): State<AppState>,
    Path(plan_uuid): Path<Uuid>,
    Query(query): Query<ListRunsQuery>,
) -> AppResult<impl IntoResponse> {
    PlanRepo::find_by_id(&state.pool, plan_uuid)
        .await?
        .ok_or_else(|| not_found("Plan", plan_uuid))?;

    let runs = RunRepo::list_for_plan(&state.pool, plan_uuid, query.limit, query.offset).await?;
    let mut details = Vec::with_capacity(runs.len());
    for run in runs {
        let jobs = JobRepo::list_for_run(&state.pool, run.uuid).await?;
        details.push(RunDetail::from_parts(run, jobs));
    }

    Ok(Json(DataResponse { data: details }))
}
