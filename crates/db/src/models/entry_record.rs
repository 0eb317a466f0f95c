//! Entry record (registered vehicle) model and DTOs.

use chrono::Utc;
use pms_core::error::CoreError;
use pms_core::parking::EntryRecord;
use pms_core::status::{EntryRecordStatus, StatusId};
use pms_core::types::{Amount, DbId, Timestamp};
use pms_core::vehicle::{validate_entry_time, validate_plate_number};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// A row from the `entry_records` table.
#[derive(Debug, Clone, FromRow)]
pub struct EntryRecordRow {
    pub id: DbId,
    pub plate_number: String,
    pub parking_code: String,
    pub owner_id: DbId,
    pub entry_time: Timestamp,
    pub exit_time: Option<Timestamp>,
    pub charged_amount: Option<Amount>,
    pub status_id: StatusId,
    pub parking_slot_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// API representation of an entry record with the status label resolved.
#[derive(Debug, Clone, Serialize)]
pub struct EntryRecordResponse {
    pub id: DbId,
    pub plate_number: String,
    pub parking_code: String,
    pub owner_id: DbId,
    pub entry_time: Timestamp,
    pub exit_time: Option<Timestamp>,
    pub charged_amount: Option<Amount>,
    pub status: EntryRecordStatus,
    pub parking_slot_id: Option<DbId>,
    pub created_at: Timestamp,
}

impl EntryRecordRow {
    fn status(&self) -> Result<EntryRecordStatus, CoreError> {
        EntryRecordStatus::from_id(self.status_id).ok_or_else(|| {
            CoreError::Internal(format!(
                "Entry record {} has unknown status_id {}",
                self.id, self.status_id
            ))
        })
    }

    pub fn into_domain(self) -> Result<EntryRecord, CoreError> {
        Ok(EntryRecord {
            status: self.status()?,
            id: self.id,
            plate_number: self.plate_number,
            owner_id: self.owner_id,
            entry_time: self.entry_time,
            exit_time: self.exit_time,
            charged_amount: self.charged_amount,
            parking_slot_id: self.parking_slot_id,
        })
    }

    pub fn into_response(self) -> Result<EntryRecordResponse, CoreError> {
        Ok(EntryRecordResponse {
            status: self.status()?,
            id: self.id,
            plate_number: self.plate_number,
            parking_code: self.parking_code,
            owner_id: self.owner_id,
            entry_time: self.entry_time,
            exit_time: self.exit_time,
            charged_amount: self.charged_amount,
            parking_slot_id: self.parking_slot_id,
            created_at: self.created_at,
        })
    }
}

fn validate_plate(plate: &str) -> Result<(), ValidationError> {
    validate_plate_number(plate).map_err(|e| {
        let mut err = ValidationError::new("plate_number");
        if let CoreError::Validation(msg) = e {
            err.message = Some(msg.into());
        }
        err
    })
}

fn validate_entry_time_not_future(entry_time: &Timestamp) -> Result<(), ValidationError> {
    validate_entry_time(*entry_time, Utc::now()).map_err(|_| {
        let mut err = ValidationError::new("entry_time");
        err.message = Some("Entry time must not be in the future".into());
        err
    })
}

/// DTO for registering a vehicle's entry. The owner is the caller.
///
/// `entry_time` defaults to now when omitted and may not lie in the future.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRecord {
    #[validate(custom(function = "validate_plate"))]
    pub plate_number: String,
    #[validate(length(min = 1, max = 32, message = "parking_code must be 1-32 characters"))]
    pub parking_code: String,
    #[validate(custom(function = "validate_entry_time_not_future"))]
    pub entry_time: Option<Timestamp>,
}
