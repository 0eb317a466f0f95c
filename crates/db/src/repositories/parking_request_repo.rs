//! Repository for the `parking_requests` table.
//!
//! Status transitions are compare-and-swap updates guarded on the current
//! `status_id`; a `None` return means another transaction got there first.

use pms_core::parking::RequestDraft;
use pms_core::status::RequestStatus;
use pms_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::parking_request::{ParkingRequestDetails, ParkingRequestRow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, entry_record_id, desired_slot_id, check_in, check_out, \
                       status_id, approved_at, assigned_slot_id, decided_at, released_at, \
                       created_at, updated_at";

/// Joined projection for the request listings.
const DETAILS_SELECT: &str = "SELECT
        pr.id, rs.name AS status, pr.check_in, pr.check_out,
        pr.approved_at, pr.decided_at, pr.released_at, pr.created_at,
        pr.user_id, u.names AS requester_names, u.email AS requester_email,
        pr.entry_record_id, er.plate_number, er.parking_code, er.entry_time,
        er.exit_time, er.charged_amount,
        pr.desired_slot_id, pr.assigned_slot_id,
        ps.slot_number AS assigned_slot_number, ps.location AS assigned_slot_location
    FROM parking_requests pr
    JOIN request_statuses rs ON rs.id = pr.status_id
    JOIN users u ON u.id = pr.user_id
    JOIN entry_records er ON er.id = pr.entry_record_id
    LEFT JOIN parking_slots ps ON ps.id = pr.assigned_slot_id";

/// Provides lifecycle and listing operations for parking requests.
pub struct ParkingRequestRepo;

impl ParkingRequestRepo {
    /// Insert a new `PENDING` request.
    pub async fn create(
        conn: &mut PgConnection,
        user_id: DbId,
        draft: &RequestDraft,
    ) -> Result<ParkingRequestRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO parking_requests
                (user_id, entry_record_id, desired_slot_id, check_in, check_out, status_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParkingRequestRow>(&query)
            .bind(user_id)
            .bind(draft.entry_record_id)
            .bind(draft.desired_slot_id)
            .bind(draft.check_in)
            .bind(draft.check_out)
            .bind(RequestStatus::Pending.id())
            .fetch_one(conn)
            .await
    }

    /// Find a request by ID.
    pub async fn find_by_id(
        db: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ParkingRequestRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parking_requests WHERE id = $1");
        sqlx::query_as::<_, ParkingRequestRow>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Find a request by ID and lock it for the rest of the transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ParkingRequestRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parking_requests WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ParkingRequestRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Lock every request for an entry record, in id order.
    pub async fn lock_for_entry(
        conn: &mut PgConnection,
        entry_record_id: DbId,
    ) -> Result<Vec<ParkingRequestRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM parking_requests
             WHERE entry_record_id = $1
             ORDER BY id
             FOR UPDATE"
        );
        sqlx::query_as::<_, ParkingRequestRow>(&query)
            .bind(entry_record_id)
            .fetch_all(conn)
            .await
    }

    /// `PENDING -> APPROVED` with the assigned slot.
    pub async fn mark_approved(
        conn: &mut PgConnection,
        id: DbId,
        slot_id: DbId,
        at: Timestamp,
    ) -> Result<Option<ParkingRequestRow>, sqlx::Error> {
        let query = format!(
            "UPDATE parking_requests SET
                status_id = $2,
                assigned_slot_id = $3,
                approved_at = $4,
                decided_at = $4
             WHERE id = $1 AND status_id = $5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParkingRequestRow>(&query)
            .bind(id)
            .bind(RequestStatus::Approved.id())
            .bind(slot_id)
            .bind(at)
            .bind(RequestStatus::Pending.id())
            .fetch_optional(conn)
            .await
    }

    /// `PENDING -> REJECTED`.
    pub async fn mark_rejected(
        conn: &mut PgConnection,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<ParkingRequestRow>, sqlx::Error> {
        let query = format!(
            "UPDATE parking_requests SET status_id = $2, decided_at = $3
             WHERE id = $1 AND status_id = $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParkingRequestRow>(&query)
            .bind(id)
            .bind(RequestStatus::Rejected.id())
            .bind(at)
            .bind(RequestStatus::Pending.id())
            .fetch_optional(conn)
            .await
    }

    /// Stamp `released_at` on an approved, unreleased request.
    pub async fn mark_released(
        conn: &mut PgConnection,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<ParkingRequestRow>, sqlx::Error> {
        let query = format!(
            "UPDATE parking_requests SET released_at = $2
             WHERE id = $1 AND status_id = $3 AND released_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ParkingRequestRow>(&query)
            .bind(id)
            .bind(at)
            .bind(RequestStatus::Approved.id())
            .fetch_optional(conn)
            .await
    }

    /// List one user's requests with joined data, newest first.
    pub async fn list_details_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ParkingRequestDetails>, sqlx::Error> {
        let query = format!("{DETAILS_SELECT} WHERE pr.user_id = $1 ORDER BY pr.created_at DESC");
        sqlx::query_as::<_, ParkingRequestDetails>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// List every request with joined data, optionally filtered by status.
    pub async fn list_details(
        pool: &PgPool,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ParkingRequestDetails>, sqlx::Error> {
        let query = format!(
            "{DETAILS_SELECT} WHERE ($1::SMALLINT IS NULL OR pr.status_id = $1)
             ORDER BY pr.created_at DESC"
        );
        sqlx::query_as::<_, ParkingRequestDetails>(&query)
            .bind(status.map(RequestStatus::id))
            .fetch_all(pool)
            .await
    }
}
