//! Well-known role and lifecycle-state constants.
//!
//! The numeric ids must match the values stored in the `users.role_id`,
//! `users.state` and `tenants.state` columns.

use serde::{Deserialize, Serialize};

pub const ROLE_ROOT: &str = "root";
pub const ROLE_TENANT_ADMIN: &str = "tenant_admin";
pub const ROLE_TENANT_MEMBER: &str = "tenant_member";

/// Authorization role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Root,
    TenantAdmin,
    TenantMember,
}

impl Role {
    pub fn id(self) -> i16 {
        match self {
            Role::Root => 1,
            Role::TenantAdmin => 2,
            Role::TenantMember => 3,
        }
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Role::Root),
            2 => Some(Role::TenantAdmin),
            3 => Some(Role::TenantMember),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Root => ROLE_ROOT,
            Role::TenantAdmin => ROLE_TENANT_ADMIN,
            Role::TenantMember => ROLE_TENANT_MEMBER,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role id {0}")]
pub struct UnknownRole(pub i16);

impl TryFrom<i16> for Role {
    type Error = UnknownRole;

    fn try_from(id: i16) -> Result<Self, Self::Error> {
        Role::from_id(id).ok_or(UnknownRole(id))
    }
}

/// Lifecycle state shared by tenants and users. Records are never
/// hard-deleted; they are toggled between these two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Inactive,
    Active,
}

impl LifecycleState {
    pub fn id(self) -> i16 {
        match self {
            LifecycleState::Inactive => 0,
            LifecycleState::Active => 1,
        }
    }

    /// Unknown ids decode as `Inactive` so a bad row can never grant access.
    pub fn from_id(id: i16) -> Self {
        if id == 1 {
            LifecycleState::Active
        } else {
            LifecycleState::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        self == LifecycleState::Active
    }
}

impl From<i16> for LifecycleState {
    fn from(id: i16) -> Self {
        LifecycleState::from_id(id)
    }
}
