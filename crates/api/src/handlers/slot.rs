//! Handlers for the `/slots` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pms_core::error::CoreError;
use pms_core::types::DbId;
use pms_db::models::parking_slot::{CreateParkingSlot, UpdateParkingSlot};
use pms_db::repositories::ParkingSlotRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/slots
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let slots = ParkingSlotRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: slots }))
}

/// POST /api/v1/slots
///
/// Create a slot with all of its capacity free. Admin only.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateParkingSlot>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let slot = ParkingSlotRepo::create(&state.pool, &input).await?;

    tracing::info!(
        slot_id = slot.id,
        slot_number = slot.slot_number,
        admin_id = admin.user_id,
        "Parking slot created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: slot })))
}

/// PUT /api/v1/slots/{id}
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(slot_id): Path<DbId>,
    Json(input): Json<UpdateParkingSlot>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let slot = ParkingSlotRepo::update(&state.pool, slot_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ParkingSlot",
            id: slot_id,
        }))?;

    tracing::info!(slot_id, admin_id = admin.user_id, "Parking slot updated");

    Ok(Json(DataResponse { data: slot }))
}
