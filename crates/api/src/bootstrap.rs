//! First-run seeding of the administrator account.

use pms_core::roles::ROLE_ADMIN;
use pms_db::models::user::CreateUser;
use pms_db::repositories::UserRepo;
use pms_db::DbPool;

use crate::auth::password::{hash_password, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};

/// Administrator credentials read from the environment.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub names: String,
    pub telephone: Option<String>,
}

impl AdminSeed {
    /// Read `ADMIN_EMAIL`, `ADMIN_PASSWORD`, `ADMIN_NAMES` and
    /// `ADMIN_TELEPHONE`. Returns `None` unless both email and password are set.
    pub fn from_env() -> Option<Self> {
        let email = std::env::var("ADMIN_EMAIL").ok()?;
        let password = std::env::var("ADMIN_PASSWORD").ok()?;
        Some(Self {
            email,
            password,
            names: std::env::var("ADMIN_NAMES").unwrap_or_else(|_| "Administrator".into()),
            telephone: std::env::var("ADMIN_TELEPHONE").ok(),
        })
    }
}

/// Create the administrator account unless a user with that email exists.
///
/// Returns `true` when a new account was created.
pub async fn ensure_admin(pool: &DbPool, seed: &AdminSeed) -> AppResult<bool> {
    let email = seed.email.trim().to_ascii_lowercase();

    if UserRepo::find_by_email(pool, &email).await?.is_some() {
        tracing::debug!(email = %email, "Admin account already present");
        return Ok(false);
    }

    if seed.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "ADMIN_PASSWORD must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let password_hash = hash_password(&seed.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let admin = UserRepo::create(
        pool,
        &CreateUser {
            names: seed.names.clone(),
            email,
            telephone: seed.telephone.clone(),
            password_hash,
            role: ROLE_ADMIN.to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = admin.id, "Admin account created");
    Ok(true)
}
