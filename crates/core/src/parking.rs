//! Parking domain entities as seen by the request lifecycle.
//!
//! These are storage-agnostic: the database crate converts its rows into
//! these types, and the in-memory store holds them directly.

use serde::Serialize;

use crate::error::CoreError;
use crate::status::{EntryRecordStatus, RequestStatus};
use crate::types::{Amount, DbId, Timestamp};

/// A vehicle's tracked presence from arrival to departure.
///
/// `charged_amount` is set if and only if `exit_time` is set, and both are
/// written exactly once, when the owning request is approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRecord {
    pub id: DbId,
    pub plate_number: String,
    pub owner_id: DbId,
    pub entry_time: Timestamp,
    pub exit_time: Option<Timestamp>,
    pub charged_amount: Option<Amount>,
    pub status: EntryRecordStatus,
    /// Slot whose fee schedule was applied at settlement.
    pub parking_slot_id: Option<DbId>,
}

impl EntryRecord {
    pub fn is_settled(&self) -> bool {
        self.exit_time.is_some()
    }
}

/// One allocatable parking space.
///
/// `capacity` is the single authoritative counter of free units; availability
/// is derived from it and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParkingSlot {
    pub id: DbId,
    pub slot_number: i32,
    pub hourly_fee: Amount,
    pub capacity: i32,
    pub total_capacity: i32,
}

impl ParkingSlot {
    pub fn is_available(&self) -> bool {
        self.capacity > 0
    }
}

/// A user's ask to be assigned a slot for a given vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParkingRequest {
    pub id: DbId,
    pub user_id: DbId,
    pub entry_record_id: DbId,
    pub desired_slot_id: Option<DbId>,
    pub check_in: Timestamp,
    pub check_out: Option<Timestamp>,
    pub status: RequestStatus,
    pub approved_at: Option<Timestamp>,
    /// Set only when `status` is `APPROVED`.
    pub assigned_slot_id: Option<DbId>,
    pub decided_at: Option<Timestamp>,
    pub released_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl ParkingRequest {
    /// Guard for approve/reject: only `PENDING` requests may transition.
    pub fn ensure_pending(&self) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(already_processed());
        }
        Ok(())
    }

    /// An approved request keeps one unit of its slot until released.
    pub fn holds_slot(&self) -> bool {
        self.status == RequestStatus::Approved
            && self.assigned_slot_id.is_some()
            && self.released_at.is_none()
    }
}

/// Error returned for any transition attempted on a terminal request.
pub fn already_processed() -> CoreError {
    CoreError::InvalidState("Request already processed".into())
}

/// The caller-supplied part of a new parking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDraft {
    pub entry_record_id: DbId,
    pub desired_slot_id: Option<DbId>,
    pub check_in: Timestamp,
    pub check_out: Option<Timestamp>,
}

impl RequestDraft {
    /// Reject a check-out that precedes the check-in.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(check_out) = self.check_out {
            if check_out < self.check_in {
                return Err(CoreError::Validation(
                    "checkOut must not be earlier than checkIn".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Exit time and charge written onto an entry record at approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub exit_time: Timestamp,
    pub charged_amount: Amount,
    pub slot_id: DbId,
}

/// Where outcome notifications are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContact {
    pub user_id: DbId,
    pub email: String,
    pub names: String,
}

/// Everything committed by a successful approval.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub request: ParkingRequest,
    pub entry_record: EntryRecord,
    pub slot: ParkingSlot,
    pub charged_amount: Amount,
}

/// Everything committed by a successful release.
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub request: ParkingRequest,
    pub slot: ParkingSlot,
}

/// Everything committed when an entry record is deleted.
#[derive(Debug, Clone)]
pub struct EntryRemoval {
    pub entry_record_id: DbId,
    /// Slots that got a unit of capacity back, one per released request.
    pub released_slots: Vec<ParkingSlot>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    fn request(status: RequestStatus) -> ParkingRequest {
        ParkingRequest {
            id: 1,
            user_id: 1,
            entry_record_id: 1,
            desired_slot_id: None,
            check_in: Utc::now(),
            check_out: None,
            status,
            approved_at: None,
            assigned_slot_id: None,
            decided_at: None,
            released_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ensure_pending_accepts_pending_only() {
        assert!(request(RequestStatus::Pending).ensure_pending().is_ok());
        assert_matches!(
            request(RequestStatus::Approved).ensure_pending(),
            Err(CoreError::InvalidState(msg)) if msg == "Request already processed"
        );
        assert_matches!(
            request(RequestStatus::Rejected).ensure_pending(),
            Err(CoreError::InvalidState(_))
        );
    }

    #[test]
    fn only_approved_unreleased_requests_hold_a_slot() {
        assert!(!request(RequestStatus::Pending).holds_slot());
        assert!(!request(RequestStatus::Rejected).holds_slot());

        let approved = ParkingRequest {
            assigned_slot_id: Some(3),
            ..request(RequestStatus::Approved)
        };
        assert!(approved.holds_slot());

        let released = ParkingRequest {
            released_at: Some(Utc::now()),
            ..approved
        };
        assert!(!released.holds_slot());
    }

    #[test]
    fn draft_rejects_check_out_before_check_in() {
        let now = Utc::now();
        let draft = RequestDraft {
            entry_record_id: 1,
            desired_slot_id: None,
            check_in: now,
            check_out: Some(now - Duration::minutes(5)),
        };
        assert_matches!(draft.validate(), Err(CoreError::Validation(_)));

        let open_ended = RequestDraft {
            check_out: None,
            ..draft
        };
        assert!(open_ended.validate().is_ok());
    }

    #[test]
    fn slot_availability_is_derived_from_capacity() {
        let mut slot = ParkingSlot {
            id: 1,
            slot_number: 7,
            hourly_fee: 500,
            capacity: 1,
            total_capacity: 3,
        };
        assert!(slot.is_available());
        slot.capacity = 0;
        assert!(!slot.is_available());
    }
}
