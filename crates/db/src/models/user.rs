//! User entity model and DTOs.

use serde::Deserialize;
use sqlx::FromRow;
use tsgate_core::roles::{LifecycleState, Role};
use tsgate_core::types::{DbId, Timestamp};
use uuid::Uuid;

/// Full user row from the `users` table.
///
/// Contains the password hash and reset code -- NEVER cache or serialize this
/// directly. Session snapshots are built from it instead.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: DbId,
    pub uuid: Uuid,
    pub tenant_id: DbId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_algorithm: String,
    pub password_hash: String,
    #[sqlx(try_from = "i16")]
    pub state: LifecycleState,
    #[sqlx(rename = "role_id", try_from = "i16")]
    pub role: Role,
    pub timezone: String,
    pub was_email_activated: bool,
    /// Password-reset access code, if a reset is pending.
    pub pr_access_code: Option<String>,
    pub pr_expiry_time: Option<Timestamp>,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

/// DTO for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub uuid: Uuid,
    pub tenant_id: DbId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_algorithm: String,
    pub password_hash: String,
    pub state: LifecycleState,
    pub role: Role,
    pub timezone: String,
}
