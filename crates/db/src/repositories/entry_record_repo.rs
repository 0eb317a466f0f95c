//! Repository for the `entry_records` table.

use pms_core::parking::Settlement;
use pms_core::status::{EntryRecordStatus, RequestStatus};
use pms_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::entry_record::{CreateEntryRecord, EntryRecordRow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, plate_number, parking_code, owner_id, entry_time, exit_time, \
                       charged_amount, status_id, parking_slot_id, created_at, updated_at";

/// Provides CRUD and settlement operations for entry records.
pub struct EntryRecordRepo;

impl EntryRecordRepo {
    /// Register a vehicle entry owned by `owner_id`.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateEntryRecord,
    ) -> Result<EntryRecordRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO entry_records (plate_number, parking_code, owner_id, entry_time, status_id)
             VALUES ($1, $2, $3, COALESCE($4, NOW()), $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EntryRecordRow>(&query)
            .bind(&input.plate_number)
            .bind(&input.parking_code)
            .bind(owner_id)
            .bind(input.entry_time)
            .bind(EntryRecordStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Find an entry record by ID.
    pub async fn find_by_id(
        db: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<EntryRecordRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entry_records WHERE id = $1");
        sqlx::query_as::<_, EntryRecordRow>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Find an entry record by ID and lock it for the rest of the transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<EntryRecordRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entry_records WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, EntryRecordRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List a user's entry records, most recent entry first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<EntryRecordRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entry_records WHERE owner_id = $1 ORDER BY entry_time DESC"
        );
        sqlx::query_as::<_, EntryRecordRow>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Write the exit time and charge and mark the record `APPROVED`.
    ///
    /// Returns `None` when the record is missing or already settled.
    pub async fn settle(
        conn: &mut PgConnection,
        id: DbId,
        settlement: &Settlement,
    ) -> Result<Option<EntryRecordRow>, sqlx::Error> {
        let query = format!(
            "UPDATE entry_records SET
                exit_time = $2,
                charged_amount = $3,
                status_id = $4,
                parking_slot_id = $5
             WHERE id = $1 AND exit_time IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EntryRecordRow>(&query)
            .bind(id)
            .bind(settlement.exit_time)
            .bind(settlement.charged_amount)
            .bind(EntryRecordStatus::Approved.id())
            .bind(settlement.slot_id)
            .fetch_optional(conn)
            .await
    }

    /// Delete an entry record and its requests that no longer hold a slot.
    ///
    /// A request still holding a slot blocks the delete with a foreign key
    /// violation. Returns `true` if the entry record was removed.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query(
            "DELETE FROM parking_requests
             WHERE entry_record_id = $1 AND (status_id <> $2 OR released_at IS NOT NULL)",
        )
        .bind(id)
        .bind(RequestStatus::Approved.id())
        .execute(&mut *conn)
        .await?;

        let result = sqlx::query("DELETE FROM entry_records WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
