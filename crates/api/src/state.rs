use std::sync::Arc;

use trainhub_db::models::job::JobDetail;
use trainhub_db::models::run::RunDetail;
use trainhub_notify::PollRegistry;

use crate::config::ServerConfig;
use crate::engine::ingest::EventIngest;

/// Shared application state available to all axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: trainhub_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Callback ingestion engine, shared with the dispatcher.
    pub ingest: EventIngest,
    /// Long-poll waiters keyed by run UUID.
    pub run_registry: Arc<PollRegistry<RunDetail>>,
    /// Long-poll waiters keyed by job UUID.
    pub job_registry: Arc<PollRegistry<JobDetail>>,
}
