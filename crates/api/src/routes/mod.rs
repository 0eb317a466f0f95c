pub mod auth;
pub mod health;
pub mod parking_request;
pub mod slot;
pub mod vehicle;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                          register (public)
/// /auth/login                             login (public)
///
/// /parking-requests                       submit (auth), list all (admin)
/// /parking-requests/mine                  caller's requests
/// /parking-requests/{id}/approve          approve (admin, PATCH)
/// /parking-requests/{id}/reject           reject (admin, PATCH)
/// /parking-requests/{id}/release          release slot (admin, PATCH)
///
/// /vehicles                               register entry (auth)
/// /vehicles/mine                          caller's entries
/// /vehicles/{id}                          get, delete (owner or admin)
///
/// /slots                                  list (auth), create (admin)
/// /slots/{id}                             update (admin, PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/parking-requests", parking_request::router())
        .nest("/vehicles", vehicle::router())
        .nest("/slots", slot::router())
}
