//! Handlers for the `/vehicles` resource (entry records).
//!
//! A vehicle entry is owned by the user who registered it. Only the owner or
//! an admin may read or delete it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pms_core::error::CoreError;
use pms_core::types::DbId;
use pms_core::vehicle::normalize_plate;
use pms_db::models::entry_record::{CreateEntryRecord, EntryRecordResponse, EntryRecordRow};
use pms_db::repositories::EntryRecordRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load an entry record and check the caller may see it.
async fn find_visible(
    state: &AppState,
    auth: &AuthUser,
    id: DbId,
) -> AppResult<EntryRecordRow> {
    let row = EntryRecordRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "EntryRecord",
            id,
        }))?;
    auth.ensure_owner_or_admin(row.owner_id)?;
    Ok(row)
}

/// POST /api/v1/vehicles
///
/// Register a vehicle entry for the caller. Plates are normalized to upper
/// case before validation; a plate already on record is a 409.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<CreateEntryRecord>,
) -> AppResult<impl IntoResponse> {
    input.plate_number = normalize_plate(&input.plate_number);
    input.validate()?;

    let row = EntryRecordRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(
        entry_record_id = row.id,
        owner_id = auth.user_id,
        plate = %row.plate_number,
        "Vehicle entry registered",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: row.into_response()?,
        }),
    ))
}

/// GET /api/v1/vehicles/mine
pub async fn list_mine(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let data = EntryRecordRepo::list_by_owner(&state.pool, auth.user_id)
        .await?
        .into_iter()
        .map(EntryRecordRow::into_response)
        .collect::<Result<Vec<EntryRecordResponse>, _>>()?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/vehicles/{id}
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let row = find_visible(&state, &auth, id).await?;
    Ok(Json(DataResponse {
        data: row.into_response()?,
    }))
}

/// DELETE /api/v1/vehicles/{id}
///
/// Removes the entry record together with its parking requests. A slot held
/// by an approved request is released in the same transaction.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_visible(&state, &auth, id).await?;

    let removal = state.lifecycle.remove_entry_record(id).await?;

    tracing::info!(
        entry_record_id = id,
        user_id = auth.user_id,
        released_slots = removal.released_slots.len(),
        "Vehicle entry deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
