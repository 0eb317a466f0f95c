//! Handlers for the `/parking-requests` resource.
//!
//! Submission is open to any authenticated user; approve, reject, release and
//! the full listing are admin-only. State transitions go through
//! [`RequestLifecycle`](pms_core::lifecycle::RequestLifecycle) so each one is
//! a single transaction.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pms_core::error::CoreError;
use pms_core::status::RequestStatus;
use pms_core::types::{Amount, DbId};
use pms_db::models::parking_request::CreateParkingRequest;
use pms_db::repositories::ParkingRequestRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /parking-requests`.
#[derive(Debug, Default, Deserialize)]
pub struct RequestListParams {
    /// Status label filter (`PENDING`, `APPROVED`, `REJECTED`), case-insensitive.
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub message: &'static str,
    pub slot_number: i32,
    pub charged_amount: Amount,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseResponse {
    pub message: &'static str,
    pub slot_number: i32,
    pub capacity: i32,
}

fn parse_status(label: &str) -> Result<RequestStatus, CoreError> {
    [
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
    ]
    .into_iter()
    .find(|s| s.as_str().eq_ignore_ascii_case(label.trim()))
    .ok_or_else(|| CoreError::Validation(format!("Unknown request status '{label}'")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/parking-requests
///
/// Submit a request for one of the caller's own entry records.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateParkingRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let request = state
        .lifecycle
        .submit(auth.user_id, input.into_draft())
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// GET /api/v1/parking-requests/mine
pub async fn list_mine(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let requests = ParkingRequestRepo::list_details_by_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/parking-requests
///
/// All requests with requester, entry record and assigned slot. Admin only.
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<RequestListParams>,
) -> AppResult<impl IntoResponse> {
    let status = params.status.as_deref().map(parse_status).transpose()?;
    let requests = ParkingRequestRepo::list_details(&state.pool, status).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// PATCH /api/v1/parking-requests/{id}/approve
///
/// Allocate a slot, settle the entry record and approve, atomically.
pub async fn approve(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<Json<ApprovalResponse>> {
    let outcome = state.lifecycle.approve(request_id).await?;

    tracing::info!(
        request_id,
        admin_id = admin.user_id,
        slot_number = outcome.slot.slot_number,
        "Approval recorded",
    );

    Ok(Json(ApprovalResponse {
        message: "Request approved and slot assigned",
        slot_number: outcome.slot.slot_number,
        charged_amount: outcome.charged_amount,
    }))
}

/// PATCH /api/v1/parking-requests/{id}/reject
pub async fn reject(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    state.lifecycle.reject(request_id).await?;

    tracing::info!(request_id, admin_id = admin.user_id, "Rejection recorded");

    Ok(Json(MessageResponse {
        message: "Request rejected",
    }))
}

/// PATCH /api/v1/parking-requests/{id}/release
///
/// Return the unit of capacity held by an approved request.
pub async fn release(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<Json<ReleaseResponse>> {
    let outcome = state.lifecycle.release(request_id).await?;

    tracing::info!(request_id, admin_id = admin.user_id, "Release recorded");

    Ok(Json(ReleaseResponse {
        message: "Slot released",
        slot_number: outcome.slot.slot_number,
        capacity: outcome.slot.capacity,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_is_case_insensitive() {
        assert_eq!(parse_status("pending").unwrap(), RequestStatus::Pending);
        assert_eq!(parse_status(" APPROVED ").unwrap(), RequestStatus::Approved);
        assert!(matches!(
            parse_status("cancelled"),
            Err(CoreError::Validation(_))
        ));
    }
}
