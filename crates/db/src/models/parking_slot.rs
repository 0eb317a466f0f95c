//! Parking slot entity model and DTOs.

use pms_core::parking::ParkingSlot;
use pms_core::types::{Amount, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `parking_slots` table.
///
/// `is_available` is computed in SQL from `capacity > 0`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParkingSlotRow {
    pub id: DbId,
    pub slot_number: i32,
    pub code: String,
    pub name: Option<String>,
    pub location: String,
    pub hourly_fee: Amount,
    pub capacity: i32,
    pub total_capacity: i32,
    pub is_available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ParkingSlotRow {
    pub fn into_domain(self) -> ParkingSlot {
        ParkingSlot {
            id: self.id,
            slot_number: self.slot_number,
            hourly_fee: self.hourly_fee,
            capacity: self.capacity,
            total_capacity: self.total_capacity,
        }
    }
}

/// DTO for creating a slot. Free capacity starts at `total_capacity`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateParkingSlot {
    #[validate(range(min = 1, message = "slot_number must be at least 1"))]
    pub slot_number: i32,
    #[validate(length(min = 1, max = 32, message = "code must be 1-32 characters"))]
    pub code: String,
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200, message = "location must not be empty"))]
    pub location: String,
    #[validate(range(min = 0, message = "hourly_fee must not be negative"))]
    pub hourly_fee: Amount,
    #[validate(range(min = 1, message = "total_capacity must be at least 1"))]
    pub total_capacity: i32,
}

/// DTO for updating a slot's descriptive fields and fee.
///
/// Capacity is owned by the allocator and cannot be edited here.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateParkingSlot {
    #[validate(range(min = 1, message = "slot_number must be at least 1"))]
    pub slot_number: Option<i32>,
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200, message = "location must not be empty"))]
    pub location: Option<String>,
    #[validate(range(min = 0, message = "hourly_fee must not be negative"))]
    pub hourly_fee: Option<Amount>,
}
