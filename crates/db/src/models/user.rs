//! User entity model and DTOs.

use pms_core::parking::UserContact;
use pms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub names: String,
    pub email: String,
    pub telephone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn contact(&self) -> UserContact {
        UserContact {
            user_id: self.id,
            email: self.email.clone(),
            names: self.names.clone(),
        }
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub names: String,
    pub email: String,
    pub telephone: Option<String>,
    pub role: String,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            names: user.names,
            email: user.email,
            telephone: user.telephone,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// DTO for inserting a user. The password must already be hashed.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub names: String,
    pub email: String,
    pub telephone: Option<String>,
    pub password_hash: String,
    pub role: String,
}
