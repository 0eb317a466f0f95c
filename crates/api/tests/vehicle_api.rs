//! HTTP-level integration tests for `/vehicles` (entry records).

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{delete_auth, expect_json, get_auth, patch_auth, post_json_auth};
use pms_core::roles::{ROLE_ADMIN, ROLE_USER};
use pms_db::repositories::{ParkingRequestRepo, ParkingSlotRepo};
use serde_json::json;
use sqlx::PgPool;

async fn create(pool: &PgPool, token: &str, plate: &str) -> i64 {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/vehicles",
        json!({ "plate_number": plate, "parking_code": "GATE-1" }),
        token,
    )
    .await;
    expect_json(response, StatusCode::CREATED).await["data"]["id"]
        .as_i64()
        .unwrap()
}

/// Create a one-car slot and return its id.
async fn single_slot(pool: &PgPool, admin: &str) -> i64 {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/slots",
        json!({
            "slot_number": 1,
            "code": "S-1",
            "location": "Ground floor",
            "hourly_fee": 500,
            "total_capacity": 1,
        }),
        admin,
    )
    .await;
    expect_json(response, StatusCode::CREATED).await["data"]["id"]
        .as_i64()
        .unwrap()
}

async fn submit(pool: &PgPool, token: &str, entry_record_id: i64) -> i64 {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/parking-requests",
        json!({ "entryRecordId": entry_record_id, "checkIn": Utc::now() }),
        token,
    )
    .await;
    expect_json(response, StatusCode::CREATED).await["data"]["id"]
        .as_i64()
        .unwrap()
}

async fn approve(pool: &PgPool, admin: &str, request_id: i64) -> StatusCode {
    patch_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/parking-requests/{request_id}/approve"),
        admin,
    )
    .await
    .status()
}

async fn capacity(pool: &PgPool, slot_id: i64) -> i32 {
    ParkingSlotRepo::find_by_id(pool, slot_id)
        .await
        .unwrap()
        .unwrap()
        .capacity
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_normalizes_plate(pool: PgPool) {
    let (user, token) = common::create_user(&pool, "owner@example.com", ROLE_USER).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/vehicles",
        json!({ "plate_number": "  rab 123a ", "parking_code": "GATE-1" }),
        &token,
    )
    .await;
    let json = expect_json(response, StatusCode::CREATED).await;

    assert_eq!(json["data"]["plate_number"], "RAB 123A");
    assert_eq!(json["data"]["owner_id"], user.id);
    assert_eq!(json["data"]["status"], "PENDING");
    assert!(json["data"]["exit_time"].is_null());
    assert!(json["data"]["charged_amount"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_rejects_malformed_plate(pool: PgPool) {
    let (_, token) = common::create_user(&pool, "owner@example.com", ROLE_USER).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/vehicles",
        json!({ "plate_number": "ABC-1234", "parking_code": "GATE-1" }),
        &token,
    )
    .await;
    let json = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_duplicate_plate_conflicts(pool: PgPool) {
    let (_, token) = common::create_user(&pool, "owner@example.com", ROLE_USER).await;
    let body = json!({ "plate_number": "RAB 123A", "parking_code": "GATE-1" });

    let first = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/vehicles",
        body.clone(),
        &token,
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second =
        post_json_auth(common::build_test_app(pool), "/api/v1/vehicles", body, &token).await;
    let json = expect_json(second, StatusCode::CONFLICT).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_only_owner_or_admin_can_read_and_delete(pool: PgPool) {
    let (_, owner) = common::create_user(&pool, "owner@example.com", ROLE_USER).await;
    let (_, stranger) = common::create_user(&pool, "stranger@example.com", ROLE_USER).await;
    let (_, admin) = common::create_user(&pool, "admin@example.com", ROLE_ADMIN).await;

    let created = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/vehicles",
        json!({ "plate_number": "RAC 456B", "parking_code": "GATE-2" }),
        &owner,
    )
    .await;
    let id = expect_json(created, StatusCode::CREATED).await["data"]["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/v1/vehicles/{id}");

    let response = get_auth(common::build_test_app(pool.clone()), &uri, &stranger).await;
    let json = expect_json(response, StatusCode::FORBIDDEN).await;
    assert_eq!(json["code"], "UNAUTHORIZED");

    let response = delete_auth(common::build_test_app(pool.clone()), &uri, &stranger).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(common::build_test_app(pool.clone()), &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete_auth(common::build_test_app(pool.clone()), &uri, &owner).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(common::build_test_app(pool), &uri, &owner).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_list_mine_only_returns_own_entries(pool: PgPool) {
    let (_, owner) = common::create_user(&pool, "owner@example.com", ROLE_USER).await;
    let (_, other) = common::create_user(&pool, "other@example.com", ROLE_USER).await;

    for (plate, token) in [("RAB 111A", &owner), ("RAB 222B", &owner), ("RAC 333C", &other)] {
        let response = post_json_auth(
            common::build_test_app(pool.clone()),
            "/api/v1/vehicles",
            json!({ "plate_number": plate, "parking_code": "GATE-1" }),
            token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = get_auth(common::build_test_app(pool), "/api/v1/vehicles/mine", &owner).await;
    let json = expect_json(response, StatusCode::OK).await;
    let plates: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["plate_number"].as_str().unwrap())
        .collect();
    assert_eq!(plates.len(), 2);
    assert!(!plates.contains(&"RAC 333C"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_rejects_future_entry_time(pool: PgPool) {
    let (_, token) = common::create_user(&pool, "owner@example.com", ROLE_USER).await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/vehicles",
        json!({
            "plate_number": "RAB 123A",
            "parking_code": "GATE-1",
            "entry_time": Utc::now() + Duration::hours(2),
        }),
        &token,
    )
    .await;
    let json = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let response = get_auth(common::build_test_app(pool), "/api/v1/vehicles/mine", &token).await;
    let json = expect_json(response, StatusCode::OK).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_deleting_vehicle_with_approved_request_frees_its_slot(pool: PgPool) {
    let (_, admin) = common::create_user(&pool, "admin@example.com", ROLE_ADMIN).await;
    let (_, owner) = common::create_user(&pool, "owner@example.com", ROLE_USER).await;
    let slot_id = single_slot(&pool, &admin).await;

    let entry_id = create(&pool, &owner, "RAB 123A").await;
    let request_id = submit(&pool, &owner, entry_id).await;
    assert_eq!(approve(&pool, &admin, request_id).await, StatusCode::OK);
    assert_eq!(capacity(&pool, slot_id).await, 0);

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/vehicles/{entry_id}"),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(capacity(&pool, slot_id).await, 1);
    assert!(ParkingRequestRepo::find_by_id(&pool, request_id)
        .await
        .unwrap()
        .is_none());

    let next_entry = create(&pool, &owner, "RAC 456B").await;
    let next_request = submit(&pool, &owner, next_entry).await;
    assert_eq!(approve(&pool, &admin, next_request).await, StatusCode::OK);
    assert_eq!(capacity(&pool, slot_id).await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_deleting_vehicle_with_pending_request_removes_it(pool: PgPool) {
    let (_, admin) = common::create_user(&pool, "admin@example.com", ROLE_ADMIN).await;
    let (_, owner) = common::create_user(&pool, "owner@example.com", ROLE_USER).await;
    let slot_id = single_slot(&pool, &admin).await;

    let entry_id = create(&pool, &owner, "RAB 123A").await;
    let request_id = submit(&pool, &owner, entry_id).await;

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/vehicles/{entry_id}"),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(capacity(&pool, slot_id).await, 1);

    let response = approve(&pool, &admin, request_id).await;
    assert_eq!(response, StatusCode::NOT_FOUND);

    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/parking-requests/mine",
        &owner,
    )
    .await;
    let json = expect_json(response, StatusCode::OK).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}
