//! Route definitions for the `/vehicles` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::vehicle;
use crate::state::AppState;

/// Routes mounted at `/vehicles`.
///
/// ```text
/// POST   /        -> create
/// GET    /mine    -> list_mine
/// GET    /{id}    -> get
/// DELETE /{id}    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(vehicle::create))
        .route("/mine", get(vehicle::list_mine))
        .route("/{id}", get(vehicle::get).delete(vehicle::delete))
}
