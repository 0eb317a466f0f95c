//! HTTP-level integration tests for registration, login and the bearer-token
//! extractors.

mod common;

use axum::http::StatusCode;
use common::{body_json, expect_json, get, get_auth, post_json, TEST_PASSWORD};
use pms_api::bootstrap::{ensure_admin, AdminSeed};
use pms_core::roles::{ROLE_ADMIN, ROLE_USER};
use pms_db::repositories::UserRepo;
use serde_json::json;
use sqlx::PgPool;

fn registration(email: &str) -> serde_json::Value {
    json!({
        "names": "Jane Driver",
        "email": email,
        "telephone": "0788123456",
        "password": "s3cure-password",
    })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_creates_user_role_account(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let response = post_json(app, "/api/v1/auth/register", registration("Jane@Example.com")).await;
    let json = expect_json(response, StatusCode::CREATED).await;

    assert_eq!(json["data"]["email"], "jane@example.com");
    assert_eq!(json["data"]["role"], ROLE_USER);
    assert!(json["data"].get("password_hash").is_none());

    let stored = UserRepo::find_by_email(&pool, "jane@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password_hash, "s3cure-password");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_duplicate_email_conflicts(pool: PgPool) {
    let first = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/register",
        registration("dup@example.com"),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(
        common::build_test_app(pool),
        "/api/v1/auth/register",
        registration("dup@example.com"),
    )
    .await;
    let json = expect_json(second, StatusCode::CONFLICT).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_rejects_short_password(pool: PgPool) {
    let app = common::build_test_app(pool);
    let mut body = registration("short@example.com");
    body["password"] = json!("short");

    let response = post_json(app, "/api/v1/auth/register", body).await;
    let json = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_returns_usable_token(pool: PgPool) {
    let (user, _) = common::create_user(&pool, "login@example.com", ROLE_USER).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/login",
        json!({ "email": "login@example.com", "password": TEST_PASSWORD }),
    )
    .await;
    let json = expect_json(response, StatusCode::OK).await;

    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["expires_in"], 15 * 60);
    assert_eq!(json["user"]["id"], user.id);
    let token = json["access_token"].as_str().unwrap();

    let mine = get_auth(
        common::build_test_app(pool),
        "/api/v1/vehicles/mine",
        token,
    )
    .await;
    assert_eq!(mine.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_wrong_password_is_unauthenticated(pool: PgPool) {
    common::create_user(&pool, "wrongpw@example.com", ROLE_USER).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": "wrongpw@example.com", "password": "not-the-password" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_unknown_email_is_unauthenticated(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": "ghost@example.com", "password": TEST_PASSWORD }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_missing_or_garbage_token_is_401(pool: PgPool) {
    let response = get(common::build_test_app(pool.clone()), "/api/v1/vehicles/mine").await;
    let json = expect_json(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(json["code"], "UNAUTHENTICATED");

    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/vehicles/mine",
        "not.a.jwt",
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_seed_is_idempotent(pool: PgPool) {
    let seed = AdminSeed {
        email: "Admin@Example.com".into(),
        password: "admin-password".into(),
        names: "Administrator".into(),
        telephone: None,
    };

    assert!(ensure_admin(&pool, &seed).await.unwrap());
    assert!(!ensure_admin(&pool, &seed).await.unwrap());

    let admin = UserRepo::find_by_email(&pool, "admin@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.role, ROLE_ADMIN);

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/auth/login",
        json!({ "email": "admin@example.com", "password": "admin-password" }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["user"]["role"], ROLE_ADMIN);
}
