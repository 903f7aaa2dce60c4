//! Handlers for job events: the inbound station callback and the
//! event listing.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use trainhub_db::models::job_event::CreateJobEvent;
use trainhub_db::repositories::{JobEventRepo, JobRepo};
use uuid::Uuid;

use crate::error::{not_found, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /runs/{runUuid}/jobs/{jobUuid}/events
///
/// The station callback. Authenticated by the per-job secret inside the
/// body; all state transitions go through the ingestion engine.
pub async fn create_event(
    State(state): State<AppState>,
    Path((run_uuid, job_uuid)): Path<(Uuid, Uuid)>,
    Json(input): Json<CreateJobEvent>,
) -> AppResult<impl IntoResponse> {
    let event = state.ingest.create_event(run_uuid, job_uuid, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: event })))
}

/// Query parameters for event listing.
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    /// Return only events strictly after this event, in occurrence
    /// order.
    pub after: Option<Uuid>,
}

/// GET /runs/{runUuid}/jobs/{jobUuid}/events[?after={eventUuid}]
pub async fn list_events(
    State(state): State<AppState>,
    Path((run_uuid, job_uuid)): Path<(Uuid, Uuid)>,
    Query(query): Query<ListEventsQuery>,
) -> AppResult<impl IntoResponse> {
    let job = JobRepo::find_by_id(&state.pool, job_uuid)
        .await?
        .ok_or_else(|| not_found("Job", job_uuid))?;
    if job.run_uuid != run_uuid {
        return Err(not_found("Job", job_uuid));
    }

    let events = match query.after {
        Some(event_uuid) => {
            let reference = JobEventRepo::find_by_id(&state.pool, event_uuid)
                .await?
                .filter(|e| e.job_uuid == job_uuid)
                .ok_or_else(|| not_found("JobEvent", event_uuid))?;
            JobEventRepo::list_after(&state.pool, job_uuid, &reference).await?
        }
        None => JobEventRepo::list_for_job(&state.pool, job_uuid).await?,
    };

    Ok(Json(DataResponse { data: events }))
}
