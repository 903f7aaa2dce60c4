//! Run, job, event, and artifact routes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{artifacts, events, jobs, runs};
use crate::state::AppState;

/// ```text
/// POST /runs                                     -> create_run
/// GET  /runs/{uuid}                              -> get_run (?after)
/// PUT  /runs/{uuid}                              -> update_run
/// GET  /runs/{r}/jobs                            -> list_jobs
/// GET  /runs/{r}/jobs/{j}                        -> get_job (?after)
/// GET  /runs/{r}/jobs/{j}/events                 -> list_events (?after)
/// POST /runs/{r}/jobs/{j}/events                 -> create_event (callback)
/// GET  /runs/{r}/jobs/{j}/artifacts              -> list_artifacts
/// POST /runs/{r}/jobs/{j}/artifacts              -> create_artifact (callback)
/// GET  /runs/{r}/jobs/{j}/artifacts/{a}          -> get_artifact
/// GET  /runs/{r}/jobs/{j}/artifacts/{a}/download -> download_artifact
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/runs", post(runs::create_run))
        .route("/runs/{run_uuid}", get(runs::get_run).put(runs::update_run))
        .route("/runs/{run_uuid}/jobs", get(jobs::list_jobs))
        .route("/runs/{run_uuid}/jobs/{job_uuid}", get(jobs::get_job))
        .route(
            "/runs/{run_uuid}/jobs/{job_uuid}/events",
            get(events::list_events).post(events::create_event),
        )
        .route(
            "/runs/{run_uuid}/jobs/{job_uuid}/artifacts",
            get(artifacts::list_artifacts).post(artifacts::create_artifact),
        )
        .route(
            "/runs/{run_uuid}/jobs/{job_uuid}/artifacts/{artifact_uuid}",
            get(artifacts::get_artifact),
        )
        .route(
            "/runs/{run_uuid}/jobs/{job_uuid}/artifacts/{artifact_uuid}/download",
            get(artifacts::download_artifact),
        )
}
