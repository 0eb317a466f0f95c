//! [`ParkingStore`] backed by PostgreSQL transactions.
//!
//! Each unit of work is one `sqlx` transaction. `lock_*` methods issue
//! `SELECT ... FOR UPDATE`; dropping a [`PgUnitOfWork`] without committing
//! rolls the transaction back.

use pms_core::error::CoreError;
use pms_core::parking::{
    EntryRecord, ParkingRequest, ParkingSlot, RequestDraft, Settlement, UserContact,
};
use pms_core::store::{
    EntryRecordStore, ParkingStore, RequestStore, SlotStore, UnitOfWork, UserDirectory,
};
use pms_core::types::{DbId, Timestamp};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::entry_record::EntryRecordRow;
use crate::models::parking_request::ParkingRequestRow;
use crate::models::parking_slot::ParkingSlotRow;
use crate::repositories::{EntryRecordRepo, ParkingRequestRepo, ParkingSlotRepo, UserRepo};

/// Log a database error and convert it to a sanitized [`CoreError`].
fn storage_failure(op: &'static str) -> impl FnOnce(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(error = %e, op, "Parking store operation failed");
        CoreError::StorageFailure(format!("Database operation '{op}' failed"))
    }
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503"))
}

fn slot(row: Option<ParkingSlotRow>) -> Option<ParkingSlot> {
    row.map(ParkingSlotRow::into_domain)
}

fn entry(row: Option<EntryRecordRow>) -> Result<Option<EntryRecord>, CoreError> {
    row.map(EntryRecordRow::into_domain).transpose()
}

fn request(row: Option<ParkingRequestRow>) -> Result<Option<ParkingRequest>, CoreError> {
    row.map(ParkingRequestRow::into_domain).transpose()
}

#[derive(Clone)]
pub struct PgParkingStore {
    pool: PgPool,
}

impl PgParkingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserDirectory for PgParkingStore {
    async fn find_user_contact(&self, user_id: DbId) -> Result<Option<UserContact>, CoreError> {
        let user = UserRepo::find_by_id(&self.pool, user_id)
            .await
            .map_err(storage_failure("find_user_contact"))?;
        Ok(user.map(|u| u.contact()))
    }
}

impl ParkingStore for PgParkingStore {
    type Work = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, CoreError> {
        let tx = self.pool.begin().await.map_err(storage_failure("begin"))?;
        Ok(PgUnitOfWork { tx })
    }
}

/// One open transaction.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl EntryRecordStore for PgUnitOfWork {
    async fn find_entry_record(&mut self, id: DbId) -> Result<Option<EntryRecord>, CoreError> {
        let row = EntryRecordRepo::find_by_id(&mut *self.tx, id)
            .await
            .map_err(storage_failure("find_entry_record"))?;
        entry(row)
    }

    async fn lock_entry_record(&mut self, id: DbId) -> Result<Option<EntryRecord>, CoreError> {
        let row = EntryRecordRepo::find_for_update(&mut self.tx, id)
            .await
            .map_err(storage_failure("lock_entry_record"))?;
        entry(row)
    }

    async fn settle_entry_record(
        &mut self,
        id: DbId,
        settlement: &Settlement,
    ) -> Result<Option<EntryRecord>, CoreError> {
        let row = EntryRecordRepo::settle(&mut self.tx, id, settlement)
            .await
            .map_err(storage_failure("settle_entry_record"))?;
        entry(row)
    }

    async fn delete_entry_record(&mut self, id: DbId) -> Result<bool, CoreError> {
        match EntryRecordRepo::delete(&mut self.tx, id).await {
            Ok(deleted) => Ok(deleted),
            Err(e) if is_foreign_key_violation(&e) => {
                tracing::warn!(entry_record_id = id, "Entry record still holds a parking slot");
                Err(CoreError::Conflict(format!(
                    "Entry record {id} still holds a parking slot"
                )))
            }
            Err(e) => Err(storage_failure("delete_entry_record")(e)),
        }
    }
}

impl SlotStore for PgUnitOfWork {
    async fn find_slot(&mut self, id: DbId) -> Result<Option<ParkingSlot>, CoreError> {
        let row = ParkingSlotRepo::find_by_id(&mut *self.tx, id)
            .await
            .map_err(storage_failure("find_slot"))?;
        Ok(slot(row))
    }

    async fn reserve_slot(&mut self, id: DbId) -> Result<Option<ParkingSlot>, CoreError> {
        let row = ParkingSlotRepo::reserve(&mut self.tx, id)
            .await
            .map_err(storage_failure("reserve_slot"))?;
        Ok(slot(row))
    }

    async fn reserve_any_slot(&mut self) -> Result<Option<ParkingSlot>, CoreError> {
        let row = ParkingSlotRepo::reserve_any(&mut self.tx)
            .await
            .map_err(storage_failure("reserve_any_slot"))?;
        Ok(slot(row))
    }

    async fn release_slot(&mut self, id: DbId) -> Result<Option<ParkingSlot>, CoreError> {
        let row = ParkingSlotRepo::release(&mut self.tx, id)
            .await
            .map_err(storage_failure("release_slot"))?;
        Ok(slot(row))
    }
}

impl RequestStore for PgUnitOfWork {
    async fn insert_request(
        &mut self,
        user_id: DbId,
        draft: &RequestDraft,
    ) -> Result<ParkingRequest, CoreError> {
        ParkingRequestRepo::create(&mut self.tx, user_id, draft)
            .await
            .map_err(storage_failure("insert_request"))?
            .into_domain()
    }

    async fn lock_request(&mut self, id: DbId) -> Result<Option<ParkingRequest>, CoreError> {
        let row = ParkingRequestRepo::find_for_update(&mut self.tx, id)
            .await
            .map_err(storage_failure("lock_request"))?;
        request(row)
    }

    async fn lock_requests_for_entry(
        &mut self,
        entry_record_id: DbId,
    ) -> Result<Vec<ParkingRequest>, CoreError> {
        ParkingRequestRepo::lock_for_entry(&mut self.tx, entry_record_id)
            .await
            .map_err(storage_failure("lock_requests_for_entry"))?
            .into_iter()
            .map(ParkingRequestRow::into_domain)
            .collect()
    }

    async fn mark_approved(
        &mut self,
        id: DbId,
        slot_id: DbId,
        at: Timestamp,
    ) -> Result<Option<ParkingRequest>, CoreError> {
        let row = ParkingRequestRepo::mark_approved(&mut self.tx, id, slot_id, at)
            .await
            .map_err(storage_failure("mark_approved"))?;
        request(row)
    }

    async fn mark_rejected(
        &mut self,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<ParkingRequest>, CoreError> {
        let row = ParkingRequestRepo::mark_rejected(&mut self.tx, id, at)
            .await
            .map_err(storage_failure("mark_rejected"))?;
        request(row)
    }

    async fn mark_released(
        &mut self,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<ParkingRequest>, CoreError> {
        let row = ParkingRequestRepo::mark_released(&mut self.tx, id, at)
            .await
            .map_err(storage_failure("mark_released"))?;
        request(row)
    }
}

impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> Result<(), CoreError> {
        self.tx.commit().await.map_err(storage_failure("commit"))
    }
}
