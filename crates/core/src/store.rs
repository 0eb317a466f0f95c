//! Persistence contracts required by the request lifecycle.
//!
//! Every mutation happens inside a [`UnitOfWork`] obtained from
//! [`ParkingStore::begin`]. A unit of work is all-or-nothing: its changes
//! become visible only when [`UnitOfWork::commit`] succeeds, and dropping it
//! without committing discards them.
//!
//! Rows read through the `lock_*` methods stay locked against other units of
//! work until this one ends. The `mark_*`, `settle_*` and slot methods are
//! conditional updates: they return `None` instead of applying when their
//! precondition no longer holds.

use std::future::Future;

use crate::error::CoreError;
use crate::parking::{EntryRecord, ParkingRequest, ParkingSlot, RequestDraft, Settlement, UserContact};
use crate::types::{DbId, Timestamp};

/// Entry record access within a unit of work.
pub trait EntryRecordStore: Send {
    /// Read an entry record without locking it.
    fn find_entry_record(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<EntryRecord>, CoreError>> + Send;

    /// Read and lock an entry record.
    fn lock_entry_record(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<EntryRecord>, CoreError>> + Send;

    /// Write exit time and charge, and mark the record `APPROVED`.
    ///
    /// Applies only while `exit_time` is unset.
    fn settle_entry_record(
        &mut self,
        id: DbId,
        settlement: &Settlement,
    ) -> impl Future<Output = Result<Option<EntryRecord>, CoreError>> + Send;

    /// Delete an entry record together with the requests that reference it.
    ///
    /// Fails with [`CoreError::Conflict`] while any of those requests still
    /// holds a slot. Returns `false` when the record does not exist.
    fn delete_entry_record(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send;
}

/// Slot inventory access within a unit of work.
pub trait SlotStore: Send {
    fn find_slot(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<ParkingSlot>, CoreError>> + Send;

    /// Take one unit of capacity from a specific slot.
    ///
    /// Applies only while the slot has capacity left.
    fn reserve_slot(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<ParkingSlot>, CoreError>> + Send;

    /// Take one unit of capacity from any available slot.
    ///
    /// The choice among available slots is arbitrary and must not depend on
    /// insertion order. Returns `None` when no slot can be reserved.
    fn reserve_any_slot(
        &mut self,
    ) -> impl Future<Output = Result<Option<ParkingSlot>, CoreError>> + Send;

    /// Return one unit of capacity to a slot.
    ///
    /// Applies only while the slot is below its total capacity.
    fn release_slot(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<ParkingSlot>, CoreError>> + Send;
}

/// Parking request access within a unit of work.
pub trait RequestStore: Send {
    /// Insert a new `PENDING` request.
    fn insert_request(
        &mut self,
        user_id: DbId,
        draft: &RequestDraft,
    ) -> impl Future<Output = Result<ParkingRequest, CoreError>> + Send;

    /// Read and lock a request.
    fn lock_request(
        &mut self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<ParkingRequest>, CoreError>> + Send;

    /// Read and lock every request for an entry record, in id order.
    fn lock_requests_for_entry(
        &mut self,
        entry_record_id: DbId,
    ) -> impl Future<Output = Result<Vec<ParkingRequest>, CoreError>> + Send;

    /// `PENDING -> APPROVED` with the assigned slot. Applies only while `PENDING`.
    fn mark_approved(
        &mut self,
        id: DbId,
        slot_id: DbId,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<ParkingRequest>, CoreError>> + Send;

    /// `PENDING -> REJECTED`. Applies only while `PENDING`.
    fn mark_rejected(
        &mut self,
        id: DbId,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<ParkingRequest>, CoreError>> + Send;

    /// Stamp `released_at`. Applies only to `APPROVED`, unreleased requests.
    fn mark_released(
        &mut self,
        id: DbId,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<ParkingRequest>, CoreError>> + Send;
}

/// A transactional boundary spanning entry records, slots and requests.
pub trait UnitOfWork: EntryRecordStore + SlotStore + RequestStore {
    /// Make every change in this unit of work durable and visible at once.
    fn commit(self) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Read-only user lookups, used outside any unit of work.
pub trait UserDirectory: Send + Sync {
    fn find_user_contact(
        &self,
        user_id: DbId,
    ) -> impl Future<Output = Result<Option<UserContact>, CoreError>> + Send;
}

/// Entry point to the persistence gateway.
pub trait ParkingStore: UserDirectory {
    type Work: UnitOfWork;

    /// Open a new unit of work.
    fn begin(&self) -> impl Future<Output = Result<Self::Work, CoreError>> + Send;
}
