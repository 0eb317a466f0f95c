//! Route definitions for the `/parking-requests` resource.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::parking_request;
use crate::state::AppState;

/// Routes mounted at `/parking-requests`.
///
/// ```text
/// GET   /               -> list_all (admin, ?status=)
/// POST  /               -> create
/// GET   /mine           -> list_mine
/// PATCH /{id}/approve   -> approve (admin)
/// PATCH /{id}/reject    -> reject (admin)
/// PATCH /{id}/release   -> release (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(parking_request::list_all).post(parking_request::create),
        )
        .route("/mine", get(parking_request::list_mine))
        .route("/{id}/approve", patch(parking_request::approve))
        .route("/{id}/reject", patch(parking_request::reject))
        .route("/{id}/release", patch(parking_request::release))
}
