//! Parking request model, read projections and DTOs.

use pms_core::error::CoreError;
use pms_core::parking::{ParkingRequest, RequestDraft};
use pms_core::status::{RequestStatus, StatusId};
use pms_core::types::{Amount, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `parking_requests` table.
#[derive(Debug, Clone, FromRow)]
pub struct ParkingRequestRow {
    pub id: DbId,
    pub user_id: DbId,
    pub entry_record_id: DbId,
    pub desired_slot_id: Option<DbId>,
    pub check_in: Timestamp,
    pub check_out: Option<Timestamp>,
    pub status_id: StatusId,
    pub approved_at: Option<Timestamp>,
    pub assigned_slot_id: Option<DbId>,
    pub decided_at: Option<Timestamp>,
    pub released_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ParkingRequestRow {
    pub fn into_domain(self) -> Result<ParkingRequest, CoreError> {
        let status = RequestStatus::from_id(self.status_id).ok_or_else(|| {
            CoreError::Internal(format!(
                "Parking request {} has unknown status_id {}",
                self.id, self.status_id
            ))
        })?;
        Ok(ParkingRequest {
            id: self.id,
            user_id: self.user_id,
            entry_record_id: self.entry_record_id,
            desired_slot_id: self.desired_slot_id,
            check_in: self.check_in,
            check_out: self.check_out,
            status,
            approved_at: self.approved_at,
            assigned_slot_id: self.assigned_slot_id,
            decided_at: self.decided_at,
            released_at: self.released_at,
            created_at: self.created_at,
        })
    }
}

/// A request joined with its entry record, requester and assigned slot.
///
/// `status` is the label from `request_statuses`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParkingRequestDetails {
    pub id: DbId,
    pub status: String,
    pub check_in: Timestamp,
    pub check_out: Option<Timestamp>,
    pub approved_at: Option<Timestamp>,
    pub decided_at: Option<Timestamp>,
    pub released_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub user_id: DbId,
    pub requester_names: String,
    pub requester_email: String,
    pub entry_record_id: DbId,
    pub plate_number: String,
    pub parking_code: String,
    pub entry_time: Timestamp,
    pub exit_time: Option<Timestamp>,
    pub charged_amount: Option<Amount>,
    pub desired_slot_id: Option<DbId>,
    pub assigned_slot_id: Option<DbId>,
    pub assigned_slot_number: Option<i32>,
    pub assigned_slot_location: Option<String>,
}

/// Body of `POST /parking-requests`.
///
/// Field names follow the public camelCase contract; snake_case is accepted too.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateParkingRequest {
    #[serde(default, alias = "slot_id")]
    #[validate(range(min = 1, message = "slotId must be a positive id"))]
    pub slot_id: Option<DbId>,
    #[serde(alias = "entry_record_id")]
    #[validate(range(min = 1, message = "entryRecordId must be a positive id"))]
    pub entry_record_id: DbId,
    #[serde(alias = "check_in")]
    pub check_in: Timestamp,
    #[serde(default, alias = "check_out")]
    pub check_out: Option<Timestamp>,
}

impl CreateParkingRequest {
    pub fn into_draft(self) -> RequestDraft {
        RequestDraft {
            entry_record_id: self.entry_record_id,
            desired_slot_id: self.slot_id,
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }
}
