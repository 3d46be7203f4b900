//! Login sessions.
//!
//! - [`cache`] -- the `SessionCache` key/value capability and its in-process
//!   and Redis implementations.
//! - [`store`] -- [`SessionStore`], mapping session ids to user snapshots.

pub mod cache;
pub mod store;

use serde::{Deserialize, Serialize};
use tsgate_core::roles::{LifecycleState, Role};
use tsgate_core::types::{DbId, Timestamp};
use tsgate_db::models::user::User;
use uuid::Uuid;

pub use cache::{CacheError, MemorySessionCache, RedisSessionCache, SessionCache};
pub use store::SessionStore;

/// The user as seen at login time. Omits the password hash and any pending
/// reset code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: DbId,
    pub uuid: Uuid,
    pub tenant_id: DbId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub state: LifecycleState,
    pub timezone: String,
    pub was_email_activated: bool,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            uuid: user.uuid,
            tenant_id: user.tenant_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            state: user.state,
            timezone: user.timezone.clone(),
            was_email_activated: user.was_email_activated,
            created_at: user.created_at,
            modified_at: user.modified_at,
        }
    }
}
