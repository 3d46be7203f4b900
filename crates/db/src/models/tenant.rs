//! Tenant entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tsgate_core::roles::LifecycleState;
use tsgate_core::types::{DbId, Timestamp};
use uuid::Uuid;

/// Full tenant row from the `tenants` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Tenant {
    pub id: DbId,
    pub uuid: Uuid,
    pub name: String,
    #[sqlx(try_from = "i16")]
    pub state: LifecycleState,
    pub timezone: String,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

/// DTO for creating a new tenant. `id` and timestamps are assigned by the
/// directory.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenant {
    pub uuid: Uuid,
    pub name: String,
    pub state: LifecycleState,
    pub timezone: String,
}

impl CreateTenant {
    /// A fresh, active tenant with a random v4 uuid.
    pub fn active(name: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            state: LifecycleState::Active,
            timezone: timezone.into(),
        }
    }
}

impl From<&Tenant> for CreateTenant {
    fn from(tenant: &Tenant) -> Self {
        Self {
            uuid: tenant.uuid,
            name: tenant.name.clone(),
            state: tenant.state,
            timezone: tenant.timezone.clone(),
        }
    }
}
