//! In-process directory implementation.
//!
//! Enforces the same uniqueness rules as the PostgreSQL schema (tenant name,
//! user email, uuids) and reports violations with the same constraint names,
//! so handler code behaves identically against either backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tsgate_core::types::DbId;
use uuid::Uuid;

use crate::directory::{TenantDirectory, UserDirectory};
use crate::error::DirectoryError;
use crate::models::tenant::{CreateTenant, Tenant};
use crate::models::user::{CreateUser, User};

#[derive(Default)]
struct Tables {
    tenants: BTreeMap<DbId, Tenant>,
    users: BTreeMap<DbId, User>,
    next_tenant_id: DbId,
    next_user_id: DbId,
}

/// Tenant and user directory held entirely in memory.
///
/// Ids start at 1 and are never reused. Both traits are implemented on the
/// same value so one `Arc<MemoryDirectory>` can serve as both directories.
#[derive(Default)]
pub struct MemoryDirectory {
    tables: Mutex<Tables>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tenant_count(&self) -> usize {
        self.tables.lock().tenants.len()
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().users.len()
    }
}

fn duplicate(constraint: &str) -> DirectoryError {
    DirectoryError::Duplicate(constraint.to_string())
}

#[async_trait]
impl TenantDirectory for MemoryDirectory {
    async fn insert(&self, input: &CreateTenant) -> Result<Tenant, DirectoryError> {
        let mut tables = self.tables.lock();
        if tables.tenants.values().any(|t| t.name == input.name) {
            return Err(duplicate("uq_tenants_name"));
        }
        if tables.tenants.values().any(|t| t.uuid == input.uuid) {
            return Err(duplicate("uq_tenants_uuid"));
        }
        tables.next_tenant_id += 1;
        let now = Utc::now();
        let tenant = Tenant {
            id: tables.next_tenant_id,
            uuid: input.uuid,
            name: input.name.clone(),
            state: input.state,
            timezone: input.timezone.clone(),
            created_at: now,
            modified_at: now,
        };
        tables.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn update_by_id(&self, tenant: &Tenant) -> Result<Option<Tenant>, DirectoryError> {
        let mut tables = self.tables.lock();
        if tables
            .tenants
            .values()
            .any(|t| t.id != tenant.id && t.name == tenant.name)
        {
            return Err(duplicate("uq_tenants_name"));
        }
        let Some(row) = tables.tenants.get_mut(&tenant.id) else {
            return Ok(None);
        };
        row.name = tenant.name.clone();
        row.state = tenant.state;
        row.timezone = tenant.timezone.clone();
        row.modified_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn get_by_id(&self, id: DbId) -> Result<Option<Tenant>, DirectoryError> {
        Ok(self.tables.lock().tenants.get(&id).cloned())
    }

    async fn get_by_uuid(&self, uuid: Uuid) -> Result<Option<Tenant>, DirectoryError> {
        Ok(self
            .tables
            .lock()
            .tenants
            .values()
            .find(|t| t.uuid == uuid)
            .cloned())
    }

    async fn check_if_exists_by_id(&self, id: DbId) -> Result<bool, DirectoryError> {
        Ok(self.tables.lock().tenants.contains_key(&id))
    }

    async fn check_if_exists_by_name(&self, name: &str) -> Result<bool, DirectoryError> {
        Ok(self.tables.lock().tenants.values().any(|t| t.name == name))
    }

    async fn list_all_ids(&self) -> Result<Vec<DbId>, DirectoryError> {
        Ok(self.tables.lock().tenants.keys().copied().collect())
    }

    async fn list_all_uuids(&self) -> Result<Vec<Uuid>, DirectoryError> {
        Ok(self.tables.lock().tenants.values().map(|t| t.uuid).collect())
    }
}

impl MemoryDirectory {
    fn update_user_matching(
        &self,
        user: &User,
        matches: impl Fn(&User) -> bool,
    ) -> Result<Option<User>, DirectoryError> {
        let mut tables = self.tables.lock();
        let Some(id) = tables.users.values().find(|u| matches(u)).map(|u| u.id) else {
            return Ok(None);
        };
        if tables
            .users
            .values()
            .any(|u| u.id != id && u.email == user.email)
        {
            return Err(duplicate("uq_users_email"));
        }
        let Some(row) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        row.tenant_id = user.tenant_id;
        row.email = user.email.clone();
        row.first_name = user.first_name.clone();
        row.last_name = user.last_name.clone();
        row.password_algorithm = user.password_algorithm.clone();
        row.password_hash = user.password_hash.clone();
        row.state = user.state;
        row.role = user.role;
        row.timezone = user.timezone.clone();
        row.was_email_activated = user.was_email_activated;
        row.pr_access_code = user.pr_access_code.clone();
        row.pr_expiry_time = user.pr_expiry_time;
        row.modified_at = Utc::now();
        Ok(Some(row.clone()))
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn insert(&self, input: &CreateUser) -> Result<User, DirectoryError> {
        let mut tables = self.tables.lock();
        if tables.users.values().any(|u| u.email == input.email) {
            return Err(duplicate("uq_users_email"));
        }
        if tables.users.values().any(|u| u.uuid == input.uuid) {
            return Err(duplicate("uq_users_uuid"));
        }
        if !tables.tenants.contains_key(&input.tenant_id) {
            return Err(DirectoryError::CorruptRow(format!(
                "users.tenant_id references missing tenant {}",
                input.tenant_id
            )));
        }
        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_user_id,
            uuid: input.uuid,
            tenant_id: input.tenant_id,
            email: input.email.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            password_algorithm: input.password_algorithm.clone(),
            password_hash: input.password_hash.clone(),
            state: input.state,
            role: input.role,
            timezone: input.timezone.clone(),
            was_email_activated: false,
            pr_access_code: None,
            pr_expiry_time: None,
            created_at: now,
            modified_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_by_id(&self, user: &User) -> Result<Option<User>, DirectoryError> {
        self.update_user_matching(user, |u| u.id == user.id)
    }

    async fn update_by_email(&self, user: &User) -> Result<Option<User>, DirectoryError> {
        self.update_user_matching(user, |u| u.email == user.email)
    }

    async fn get_by_id(&self, id: DbId) -> Result<Option<User>, DirectoryError> {
        Ok(self.tables.lock().users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        Ok(self
            .tables
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn check_if_exists_by_id(&self, id: DbId) -> Result<bool, DirectoryError> {
        Ok(self.tables.lock().users.contains_key(&id))
    }

    async fn check_if_exists_by_email(&self, email: &str) -> Result<bool, DirectoryError> {
        Ok(self.tables.lock().users.values().any(|u| u.email == email))
    }
}
