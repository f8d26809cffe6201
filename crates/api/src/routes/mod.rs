pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /groups                     all non-archived groups
/// /groups/ranked              ranked for selection (distance or day mode)
/// /check-in                   check-in workflow (POST)
/// /orientation/step           save one orientation step (POST)
/// /orientation/intake         single-step full-profile intake (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(handlers::groups::list_groups))
        .route("/groups/ranked", get(handlers::groups::ranked_groups))
        .route("/check-in", post(handlers::check_in::check_in))
        .route("/orientation/step", post(handlers::orientation::update_step))
        .route("/orientation/intake", post(handlers::orientation::intake))
}
