//! Parking request state machine.
//!
//! ```text
//!            approve               release
//! PENDING ───────────► APPROVED ───────────► APPROVED (released_at set)
//!    │
//!    └──────────────► REJECTED
//!            reject
//! ```
//!
//! `APPROVED` and `REJECTED` are terminal. Each transition runs inside one
//! unit of work: the request row is locked before its status is checked, and
//! the final status write is conditional on the status still being `PENDING`.
//! Any early return drops the unit of work, which discards everything it did.

use chrono::Utc;

use crate::allocator::SlotAllocator;
use crate::billing;
use crate::error::CoreError;
use crate::notify::Notifier;
use crate::parking::{
    already_processed, ApprovalOutcome, EntryRemoval, ParkingRequest, ParkingSlot, ReleaseOutcome,
    RequestDraft, Settlement,
};
use crate::status::RequestStatus;
use crate::store::{
    EntryRecordStore, ParkingStore, RequestStore, SlotStore, UnitOfWork, UserDirectory,
};
use crate::types::{Amount, DbId, Timestamp};

/// Drives parking requests through their lifecycle.
pub struct RequestLifecycle<S, N> {
    store: S,
    notifier: N,
    allocator: SlotAllocator,
}

impl<S: ParkingStore, N: Notifier> RequestLifecycle<S, N> {
    pub fn new(store: S, notifier: N, allocator: SlotAllocator) -> Self {
        Self {
            store,
            notifier,
            allocator,
        }
    }

    /// Create a `PENDING` request for an entry record owned by `user_id`.
    ///
    /// Slot capacity is not checked here; that happens at approval.
    pub async fn submit(
        &self,
        user_id: DbId,
        draft: RequestDraft,
    ) -> Result<ParkingRequest, CoreError> {
        draft.validate()?;

        let mut work = self.store.begin().await?;

        let entry = work.find_entry_record(draft.entry_record_id).await?;
        if entry.as_ref().map(|e| e.owner_id) != Some(user_id) {
            tracing::warn!(
                user_id,
                entry_record_id = draft.entry_record_id,
                "Parking request refused: entry record not owned by caller"
            );
            return Err(CoreError::Unauthorized("Unauthorized vehicle".into()));
        }

        if let Some(slot_id) = draft.desired_slot_id {
            if work.find_slot(slot_id).await?.is_none() {
                return Err(CoreError::NotFound {
                    entity: "ParkingSlot",
                    id: slot_id,
                });
            }
        }

        let request = work.insert_request(user_id, &draft).await?;
        work.commit().await?;

        tracing::info!(
            request_id = request.id,
            user_id,
            entry_record_id = draft.entry_record_id,
            desired_slot_id = ?draft.desired_slot_id,
            "Parking request submitted"
        );

        Ok(request)
    }

    /// Approve a `PENDING` request at the current time.
    pub async fn approve(&self, request_id: DbId) -> Result<ApprovalOutcome, CoreError> {
        self.approve_at(request_id, Utc::now()).await
    }

    /// Approve a `PENDING` request, settling its entry record at `now`.
    ///
    /// Reserves a slot, bills the stay against that slot's hourly fee, and
    /// commits entry record, request and slot together. The requester is
    /// notified only after the commit succeeds.
    pub async fn approve_at(
        &self,
        request_id: DbId,
        now: Timestamp,
    ) -> Result<ApprovalOutcome, CoreError> {
        let mut work = self.store.begin().await?;

        let request = work
            .lock_request(request_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ParkingRequest",
                id: request_id,
            })?;
        request.ensure_pending()?;

        let entry = work
            .lock_entry_record(request.entry_record_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "EntryRecord",
                id: request.entry_record_id,
            })?;
        if entry.is_settled() {
            return Err(entry_already_settled(entry.id));
        }

        let slot = self
            .allocator
            .reserve_one(&mut work, request.desired_slot_id)
            .await?;

        let charged_amount = billing::compute_charge(entry.entry_time, now, slot.hourly_fee)?;

        let settlement = Settlement {
            exit_time: now,
            charged_amount,
            slot_id: slot.id,
        };
        let entry_record = work
            .settle_entry_record(entry.id, &settlement)
            .await?
            .ok_or_else(|| entry_already_settled(entry.id))?;

        let request = work
            .mark_approved(request_id, slot.id, now)
            .await?
            .ok_or_else(already_processed)?;

        work.commit().await?;

        tracing::info!(
            request_id,
            slot_id = slot.id,
            slot_number = slot.slot_number,
            charged_amount,
            remaining_capacity = slot.capacity,
            "Parking request approved"
        );

        self.notify_approval(&request, &slot, charged_amount).await;

        Ok(ApprovalOutcome {
            request,
            entry_record,
            slot,
            charged_amount,
        })
    }

    /// Reject a `PENDING` request at the current time.
    pub async fn reject(&self, request_id: DbId) -> Result<ParkingRequest, CoreError> {
        self.reject_at(request_id, Utc::now()).await
    }

    /// Reject a `PENDING` request. Touches nothing but the request itself.
    pub async fn reject_at(
        &self,
        request_id: DbId,
        now: Timestamp,
    ) -> Result<ParkingRequest, CoreError> {
        let mut work = self.store.begin().await?;

        let request = work
            .lock_request(request_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ParkingRequest",
                id: request_id,
            })?;
        request.ensure_pending()?;

        let request = work
            .mark_rejected(request_id, now)
            .await?
            .ok_or_else(already_processed)?;

        work.commit().await?;

        tracing::info!(request_id, user_id = request.user_id, "Parking request rejected");

        self.notify_rejection(&request).await;

        Ok(request)
    }

    /// Release the slot held by an approved request at the current time.
    pub async fn release(&self, request_id: DbId) -> Result<ReleaseOutcome, CoreError> {
        self.release_at(request_id, Utc::now()).await
    }

    /// Return the assigned slot's unit of capacity once the vehicle has left.
    ///
    /// A request can be released once; the slot's capacity never exceeds its
    /// total.
    pub async fn release_at(
        &self,
        request_id: DbId,
        now: Timestamp,
    ) -> Result<ReleaseOutcome, CoreError> {
        let mut work = self.store.begin().await?;

        let request = work
            .lock_request(request_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ParkingRequest",
                id: request_id,
            })?;

        let slot_id = match (request.status, request.assigned_slot_id, request.released_at) {
            (RequestStatus::Approved, Some(slot_id), None) => slot_id,
            (RequestStatus::Approved, _, Some(_)) => {
                return Err(CoreError::InvalidState("Slot already released".into()));
            }
            _ => {
                return Err(CoreError::InvalidState(
                    "Only approved requests hold a slot".into(),
                ));
            }
        };

        let slot = self.allocator.release(&mut work, slot_id).await?;

        let request = work
            .mark_released(request_id, now)
            .await?
            .ok_or_else(|| CoreError::InvalidState("Slot already released".into()))?;

        work.commit().await?;

        tracing::info!(
            request_id,
            slot_id,
            capacity = slot.capacity,
            "Parking slot released"
        );

        Ok(ReleaseOutcome { request, slot })
    }

    /// Delete an entry record at the current time.
    pub async fn remove_entry_record(
        &self,
        entry_record_id: DbId,
    ) -> Result<EntryRemoval, CoreError> {
        self.remove_entry_record_at(entry_record_id, Utc::now()).await
    }

    /// Delete an entry record and every request made for it.
    ///
    /// Requests still holding a slot are released first, stamped at `now`, so
    /// the slot's capacity comes back in the same commit as the deletion.
    /// Requests are locked before the entry record, the same order approval
    /// takes them in.
    pub async fn remove_entry_record_at(
        &self,
        entry_record_id: DbId,
        now: Timestamp,
    ) -> Result<EntryRemoval, CoreError> {
        let mut work = self.store.begin().await?;

        let requests = work.lock_requests_for_entry(entry_record_id).await?;

        work.lock_entry_record(entry_record_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "EntryRecord",
                id: entry_record_id,
            })?;

        let mut released_slots = Vec::new();
        for request in requests.iter().filter(|r| r.holds_slot()) {
            let Some(slot_id) = request.assigned_slot_id else {
                continue;
            };
            let slot = self.allocator.release(&mut work, slot_id).await?;
            work.mark_released(request.id, now)
                .await?
                .ok_or_else(|| CoreError::InvalidState("Slot already released".into()))?;
            released_slots.push(slot);
        }

        if !work.delete_entry_record(entry_record_id).await? {
            return Err(CoreError::NotFound {
                entity: "EntryRecord",
                id: entry_record_id,
            });
        }

        work.commit().await?;

        tracing::info!(
            entry_record_id,
            removed_requests = requests.len(),
            released_slots = released_slots.len(),
            "Entry record deleted"
        );

        Ok(EntryRemoval {
            entry_record_id,
            released_slots,
        })
    }

    async fn notify_approval(&self, request: &ParkingRequest, slot: &ParkingSlot, amount: Amount) {
        let Some(contact) = self.requester_contact(request).await else {
            return;
        };
        if let Err(e) = self
            .notifier
            .send_approval(&contact, slot.slot_number, amount)
            .await
        {
            tracing::warn!(
                error = %e,
                request_id = request.id,
                user_id = request.user_id,
                "Failed to send approval notification"
            );
        }
    }

    async fn notify_rejection(&self, request: &ParkingRequest) {
        let Some(contact) = self.requester_contact(request).await else {
            return;
        };
        if let Err(e) = self.notifier.send_rejection(&contact).await {
            tracing::warn!(
                error = %e,
                request_id = request.id,
                user_id = request.user_id,
                "Failed to send rejection notification"
            );
        }
    }

    async fn requester_contact(
        &self,
        request: &ParkingRequest,
    ) -> Option<crate::parking::UserContact> {
        match self.store.find_user_contact(request.user_id).await {
            Ok(Some(contact)) => Some(contact),
            Ok(None) => {
                tracing::warn!(
                    request_id = request.id,
                    user_id = request.user_id,
                    "Requester not found, skipping notification"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    request_id = request.id,
                    "Failed to look up requester, skipping notification"
                );
                None
            }
        }
    }
}

fn entry_already_settled(entry_record_id: DbId) -> CoreError {
    CoreError::InvalidState(format!("Entry record {entry_record_id} already settled"))
}
