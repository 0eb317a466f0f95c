//! Schema bootstrap and constraint tests.

use assert_matches::assert_matches;
use pms_db::models::parking_slot::CreateParkingSlot;
use pms_db::repositories::ParkingSlotRepo;
use sqlx::PgPool;

fn is_check_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(constraint),
        _ => false,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lookup_tables_are_seeded(pool: PgPool) {
    pms_db::health_check(&pool).await.unwrap();

    let requests: Vec<(i16, String)> =
        sqlx::query_as("SELECT id, name FROM request_statuses ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        requests,
        vec![
            (1, "PENDING".to_string()),
            (2, "APPROVED".to_string()),
            (3, "REJECTED".to_string()),
        ]
    );

    let entries: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entry_record_statuses")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(entries.0, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_status_ids_match_rust_enums(pool: PgPool) {
    use pms_core::status::RequestStatus;

    for status in [
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
    ] {
        let name: (String,) = sqlx::query_as("SELECT name FROM request_statuses WHERE id = $1")
            .bind(status.id())
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(name.0, status.as_str());
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_capacity_cannot_leave_bounds(pool: PgPool) {
    let slot = ParkingSlotRepo::create(
        &pool,
        &CreateParkingSlot {
            slot_number: 1,
            code: "A1".into(),
            name: None,
            location: "Level 1".into(),
            hourly_fee: 500,
            total_capacity: 2,
        },
    )
    .await
    .unwrap();
    assert_eq!(slot.capacity, 2);
    assert!(slot.is_available);

    let err = sqlx::query("UPDATE parking_slots SET capacity = -1 WHERE id = $1")
        .bind(slot.id)
        .execute(&pool)
        .await
        .unwrap_err();
    assert!(is_check_violation(&err, "ck_parking_slots_capacity"));

    let err = sqlx::query("UPDATE parking_slots SET capacity = 3 WHERE id = $1")
        .bind(slot.id)
        .execute(&pool)
        .await
        .unwrap_err();
    assert!(is_check_violation(&err, "ck_parking_slots_capacity"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_slot_number_is_rejected(pool: PgPool) {
    let input = CreateParkingSlot {
        slot_number: 4,
        code: "B4".into(),
        name: Some("North".into()),
        location: "Level 2".into(),
        hourly_fee: 300,
        total_capacity: 1,
    };
    ParkingSlotRepo::create(&pool, &input).await.unwrap();

    let again = CreateParkingSlot {
        code: "B5".into(),
        ..input
    };
    let err = ParkingSlotRepo::create(&pool, &again).await.unwrap_err();
    assert_matches!(
        &err,
        sqlx::Error::Database(db) if db.constraint() == Some("uq_parking_slots_slot_number")
    );
}
