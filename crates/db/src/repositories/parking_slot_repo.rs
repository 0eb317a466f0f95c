//! Repository for the `parking_slots` table.
//!
//! Capacity is only ever changed through [`ParkingSlotRepo::reserve`],
//! [`ParkingSlotRepo::reserve_any`] and [`ParkingSlotRepo::release`], each a
//! single conditional `UPDATE` that cannot push capacity outside
//! `0..=total_capacity`.

use pms_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::parking_slot::{CreateParkingSlot, ParkingSlotRow, UpdateParkingSlot};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, slot_number, code, name, location, hourly_fee, capacity, \
                       total_capacity, capacity > 0 AS is_available, created_at, updated_at";

/// Provides CRUD and capacity operations for parking slots.
pub struct ParkingSlotRepo;

impl ParkingSlotRepo {
    /// Insert a new slot with all of its capacity free.
    pub async fn create(
        pool: &PgPool,
        input: &CreateParkingSlot,
    ) -> Result<ParkingSlotRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO parking_slots
                (slot_number, code, name, location, hourly_fee, capacity, total_capacity)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParkingSlotRow>(&query)
            .bind(input.slot_number)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.location)
            .bind(input.hourly_fee)
            .bind(input.total_capacity)
            .fetch_one(pool)
            .await
    }

    /// Find a slot by ID.
    pub async fn find_by_id(
        db: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ParkingSlotRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parking_slots WHERE id = $1");
        sqlx::query_as::<_, ParkingSlotRow>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// List all slots ordered by slot number.
    pub async fn list(pool: &PgPool) -> Result<Vec<ParkingSlotRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parking_slots ORDER BY slot_number");
        sqlx::query_as::<_, ParkingSlotRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Update a slot. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateParkingSlot,
    ) -> Result<Option<ParkingSlotRow>, sqlx::Error> {
        let query = format!(
            "UPDATE parking_slots SET
                slot_number = COALESCE($2, slot_number),
                name = COALESCE($3, name),
                location = COALESCE($4, location),
                hourly_fee = COALESCE($5, hourly_fee)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParkingSlotRow>(&query)
            .bind(id)
            .bind(input.slot_number)
            .bind(&input.name)
            .bind(&input.location)
            .bind(input.hourly_fee)
            .fetch_optional(pool)
            .await
    }

    /// Take one unit of capacity from a specific slot.
    ///
    /// Returns `None` when the slot is missing or has no capacity left.
    pub async fn reserve(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ParkingSlotRow>, sqlx::Error> {
        let query = format!(
            "UPDATE parking_slots SET capacity = capacity - 1
             WHERE id = $1 AND capacity > 0
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParkingSlotRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Take one unit of capacity from a randomly chosen available slot.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent approvals spread
    /// over different slots instead of queueing on one row. When every
    /// available slot is locked by another transaction, waits for one of them
    /// instead of reporting no capacity.
    pub async fn reserve_any(
        conn: &mut PgConnection,
    ) -> Result<Option<ParkingSlotRow>, sqlx::Error> {
        let query = format!(
            "UPDATE parking_slots SET capacity = capacity - 1
             WHERE id = (
                 SELECT id FROM parking_slots
                 WHERE capacity > 0
                 ORDER BY random()
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {COLUMNS}"
        );
        let claimed = sqlx::query_as::<_, ParkingSlotRow>(&query)
            .fetch_optional(&mut *conn)
            .await?;
        if claimed.is_some() {
            return Ok(claimed);
        }

        let query = format!(
            "UPDATE parking_slots SET capacity = capacity - 1
             WHERE id = (
                 SELECT id FROM parking_slots
                 WHERE capacity > 0
                 ORDER BY random()
                 LIMIT 1
                 FOR UPDATE
             ) AND capacity > 0
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParkingSlotRow>(&query)
            .fetch_optional(conn)
            .await
    }

    /// Return one unit of capacity to a slot.
    ///
    /// Returns `None` when the slot is missing or already at full capacity.
    pub async fn release(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ParkingSlotRow>, sqlx::Error> {
        let query = format!(
            "UPDATE parking_slots SET capacity = capacity + 1
             WHERE id = $1 AND capacity < total_capacity
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParkingSlotRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }
}
