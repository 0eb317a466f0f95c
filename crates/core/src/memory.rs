//! In-process [`ParkingStore`] used by tests and local tooling.
//!
//! A unit of work holds the store's mutex for its whole lifetime and edits a
//! private copy of the state. Commit swaps the copy in; drop throws it away.
//! Units of work are therefore fully serialized, which is enough to exercise
//! the lifecycle's locking and rollback paths without a database.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use rand::seq::IndexedRandom;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::allocator::{return_unit, take_unit};
use crate::error::CoreError;
use crate::parking::{
    EntryRecord, ParkingRequest, ParkingSlot, RequestDraft, Settlement, UserContact,
};
use crate::status::{EntryRecordStatus, RequestStatus};
use crate::store::{
    EntryRecordStore, ParkingStore, RequestStore, SlotStore, UnitOfWork, UserDirectory,
};
use crate::types::{DbId, Timestamp};

/// A failure the next unit of work will hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `begin` fails.
    Unavailable,
    /// `commit` fails and nothing is applied.
    AbortCommit,
}

/// Everything a unit of work can change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryState {
    pub entry_records: BTreeMap<DbId, EntryRecord>,
    pub slots: BTreeMap<DbId, ParkingSlot>,
    pub requests: BTreeMap<DbId, ParkingRequest>,
    next_id: DbId,
}

impl MemoryState {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<AsyncMutex<MemoryState>>,
    users: Arc<RwLock<HashMap<DbId, UserContact>>>,
    fault: Arc<Mutex<Option<Fault>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot fault for the next unit of work.
    pub fn inject(&self, fault: Fault) {
        *self.fault.lock().unwrap_or_else(|e| e.into_inner()) = Some(fault);
    }

    fn take_fault(&self, kind: Fault) -> bool {
        let mut slot = self.fault.lock().unwrap_or_else(|e| e.into_inner());
        if *slot == Some(kind) {
            *slot = None;
            return true;
        }
        false
    }

    pub fn add_user(&self, user_id: DbId, email: &str, names: &str) {
        let contact = UserContact {
            user_id,
            email: email.to_string(),
            names: names.to_string(),
        };
        self.users
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user_id, contact);
    }

    pub async fn add_entry_record(
        &self,
        owner_id: DbId,
        plate_number: &str,
        entry_time: Timestamp,
    ) -> EntryRecord {
        let mut state = self.state.lock().await;
        let record = EntryRecord {
            id: state.allocate_id(),
            plate_number: plate_number.to_string(),
            owner_id,
            entry_time,
            exit_time: None,
            charged_amount: None,
            status: EntryRecordStatus::Pending,
            parking_slot_id: None,
        };
        state.entry_records.insert(record.id, record.clone());
        record
    }

    pub async fn add_slot(
        &self,
        slot_number: i32,
        hourly_fee: i64,
        capacity: i32,
        total_capacity: i32,
    ) -> ParkingSlot {
        let mut state = self.state.lock().await;
        let slot = ParkingSlot {
            id: state.allocate_id(),
            slot_number,
            hourly_fee,
            capacity,
            total_capacity,
        };
        state.slots.insert(slot.id, slot.clone());
        slot
    }

    /// Committed state as of now.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub async fn entry_record(&self, id: DbId) -> Option<EntryRecord> {
        self.state.lock().await.entry_records.get(&id).cloned()
    }

    pub async fn slot(&self, id: DbId) -> Option<ParkingSlot> {
        self.state.lock().await.slots.get(&id).cloned()
    }

    pub async fn request(&self, id: DbId) -> Option<ParkingRequest> {
        self.state.lock().await.requests.get(&id).cloned()
    }

    pub async fn request_count(&self) -> usize {
        self.state.lock().await.requests.len()
    }
}

impl UserDirectory for InMemoryStore {
    async fn find_user_contact(&self, user_id: DbId) -> Result<Option<UserContact>, CoreError> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.get(&user_id).cloned())
    }
}

impl ParkingStore for InMemoryStore {
    type Work = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, CoreError> {
        if self.take_fault(Fault::Unavailable) {
            return Err(CoreError::StorageFailure("store unavailable".into()));
        }
        let guard = Arc::clone(&self.state).lock_owned().await;
        let draft = guard.clone();
        Ok(MemoryUnitOfWork {
            guard,
            draft,
            store: self.clone(),
        })
    }
}

/// Serialized unit of work over an [`InMemoryStore`].
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    draft: MemoryState,
    store: InMemoryStore,
}

fn pick_available(slots: &BTreeMap<DbId, ParkingSlot>) -> Option<DbId> {
    let candidates: Vec<DbId> = slots
        .values()
        .filter(|s| s.is_available())
        .map(|s| s.id)
        .collect();
    candidates.choose(&mut rand::rng()).copied()
}

impl EntryRecordStore for MemoryUnitOfWork {
    async fn find_entry_record(&mut self, id: DbId) -> Result<Option<EntryRecord>, CoreError> {
        Ok(self.draft.entry_records.get(&id).cloned())
    }

    async fn lock_entry_record(&mut self, id: DbId) -> Result<Option<EntryRecord>, CoreError> {
        Ok(self.draft.entry_records.get(&id).cloned())
    }

    async fn settle_entry_record(
        &mut self,
        id: DbId,
        settlement: &Settlement,
    ) -> Result<Option<EntryRecord>, CoreError> {
        let Some(record) = self.draft.entry_records.get_mut(&id) else {
            return Ok(None);
        };
        if record.is_settled() {
            return Ok(None);
        }
        record.exit_time = Some(settlement.exit_time);
        record.charged_amount = Some(settlement.charged_amount);
        record.status = EntryRecordStatus::Approved;
        record.parking_slot_id = Some(settlement.slot_id);
        Ok(Some(record.clone()))
    }

    async fn delete_entry_record(&mut self, id: DbId) -> Result<bool, CoreError> {
        if !self.draft.entry_records.contains_key(&id) {
            return Ok(false);
        }
        let held = self
            .draft
            .requests
            .values()
            .any(|r| r.entry_record_id == id && r.holds_slot());
        if held {
            return Err(CoreError::Conflict(format!(
                "Entry record {id} still holds a parking slot"
            )));
        }
        self.draft.requests.retain(|_, r| r.entry_record_id != id);
        self.draft.entry_records.remove(&id);
        Ok(true)
    }
}

impl SlotStore for MemoryUnitOfWork {
    async fn find_slot(&mut self, id: DbId) -> Result<Option<ParkingSlot>, CoreError> {
        Ok(self.draft.slots.get(&id).cloned())
    }

    async fn reserve_slot(&mut self, id: DbId) -> Result<Option<ParkingSlot>, CoreError> {
        Ok(self
            .draft
            .slots
            .get_mut(&id)
            .filter(|slot| slot.is_available())
            .and_then(|slot| take_unit(slot).then(|| slot.clone())))
    }

    async fn reserve_any_slot(&mut self) -> Result<Option<ParkingSlot>, CoreError> {
        let Some(id) = pick_available(&self.draft.slots) else {
            return Ok(None);
        };
        self.reserve_slot(id).await
    }

    async fn release_slot(&mut self, id: DbId) -> Result<Option<ParkingSlot>, CoreError> {
        Ok(self
            .draft
            .slots
            .get_mut(&id)
            .and_then(|slot| return_unit(slot).then(|| slot.clone())))
    }
}

impl RequestStore for MemoryUnitOfWork {
    async fn insert_request(
        &mut self,
        user_id: DbId,
        draft: &RequestDraft,
    ) -> Result<ParkingRequest, CoreError> {
        let request = ParkingRequest {
            id: self.draft.allocate_id(),
            user_id,
            entry_record_id: draft.entry_record_id,
            desired_slot_id: draft.desired_slot_id,
            check_in: draft.check_in,
            check_out: draft.check_out,
            status: RequestStatus::Pending,
            approved_at: None,
            assigned_slot_id: None,
            decided_at: None,
            released_at: None,
            created_at: Utc::now(),
        };
        self.draft.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn lock_request(&mut self, id: DbId) -> Result<Option<ParkingRequest>, CoreError> {
        Ok(self.draft.requests.get(&id).cloned())
    }

    async fn lock_requests_for_entry(
        &mut self,
        entry_record_id: DbId,
    ) -> Result<Vec<ParkingRequest>, CoreError> {
        Ok(self
            .draft
            .requests
            .values()
            .filter(|r| r.entry_record_id == entry_record_id)
            .cloned()
            .collect())
    }

    async fn mark_approved(
        &mut self,
        id: DbId,
        slot_id: DbId,
        at: Timestamp,
    ) -> Result<Option<ParkingRequest>, CoreError> {
        let Some(request) = self.draft.requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != RequestStatus::Pending {
            return Ok(None);
        }
        request.status = RequestStatus::Approved;
        request.assigned_slot_id = Some(slot_id);
        request.approved_at = Some(at);
        request.decided_at = Some(at);
        Ok(Some(request.clone()))
    }

    async fn mark_rejected(
        &mut self,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<ParkingRequest>, CoreError> {
        let Some(request) = self.draft.requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != RequestStatus::Pending {
            return Ok(None);
        }
        request.status = RequestStatus::Rejected;
        request.decided_at = Some(at);
        Ok(Some(request.clone()))
    }

    async fn mark_released(
        &mut self,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<ParkingRequest>, CoreError> {
        let Some(request) = self.draft.requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != RequestStatus::Approved || request.released_at.is_some() {
            return Ok(None);
        }
        request.released_at = Some(at);
        Ok(Some(request.clone()))
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self) -> Result<(), CoreError> {
        let Self {
            mut guard,
            draft,
            store,
        } = self;
        if store.take_fault(Fault::AbortCommit) {
            return Err(CoreError::StorageFailure("commit aborted".into()));
        }
        *guard = draft;
        Ok(())
    }
}
