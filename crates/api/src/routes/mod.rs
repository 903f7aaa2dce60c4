//! Route definitions, mounted at the server root so callback locations
//! stay short and stable for stations.

pub mod health;
pub mod plans;
pub mod runs;

use axum::Router;

use crate::state::AppState;

/// The full application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(plans::router())
        .merge(runs::router())
}
