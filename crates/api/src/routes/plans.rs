//! Plan-scoped read routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::runs;
use crate::state::AppState;

/// ```text
/// GET /plans/{planUuid}/runs -> list_runs_for_plan (?limit, offset)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/plans/{plan_uuid}/runs", get(runs::list_runs_for_plan))
}
