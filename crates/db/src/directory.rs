//! Directory capability traits.
//!
//! The gateway never talks to a concrete database; it holds
//! `Arc<dyn TenantDirectory>` / `Arc<dyn UserDirectory>` so the PostgreSQL
//! implementation in [`crate::repositories`] and the in-memory one in
//! [`crate::memory`] are interchangeable.

use async_trait::async_trait;
use tsgate_core::types::DbId;
use uuid::Uuid;

use crate::error::DirectoryError;
use crate::models::tenant::{CreateTenant, Tenant};
use crate::models::user::{CreateUser, User};

/// CRUD access to tenant records. Tenants are never deleted.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Insert a new tenant, returning the created row.
    ///
    /// Fails with [`DirectoryError::Duplicate`] if the name or uuid is taken.
    async fn insert(&self, input: &CreateTenant) -> Result<Tenant, DirectoryError>;

    /// Overwrite name, state and timezone of an existing tenant and bump
    /// `modified_at`. Returns `None` if no row has `tenant.id`.
    async fn update_by_id(&self, tenant: &Tenant) -> Result<Option<Tenant>, DirectoryError>;

    async fn get_by_id(&self, id: DbId) -> Result<Option<Tenant>, DirectoryError>;

    async fn get_by_uuid(&self, uuid: Uuid) -> Result<Option<Tenant>, DirectoryError>;

    async fn check_if_exists_by_id(&self, id: DbId) -> Result<bool, DirectoryError>;

    async fn check_if_exists_by_name(&self, name: &str) -> Result<bool, DirectoryError>;

    /// All tenant ids in ascending order.
    async fn list_all_ids(&self) -> Result<Vec<DbId>, DirectoryError>;

    /// All tenant uuids ordered by ascending id.
    async fn list_all_uuids(&self) -> Result<Vec<Uuid>, DirectoryError>;

    /// Insert when `tenant.id` is unset (zero) or unknown, update otherwise.
    async fn insert_or_update_by_id(&self, tenant: &Tenant) -> Result<Tenant, DirectoryError> {
        if tenant.id != 0 && self.check_if_exists_by_id(tenant.id).await? {
            if let Some(updated) = self.update_by_id(tenant).await? {
                return Ok(updated);
            }
        }
        self.insert(&CreateTenant::from(tenant)).await
    }
}

/// CRUD access to user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Insert a new user, returning the created row.
    ///
    /// Fails with [`DirectoryError::Duplicate`] if the email or uuid is taken.
    async fn insert(&self, input: &CreateUser) -> Result<User, DirectoryError>;

    /// Overwrite the mutable profile and credential fields of the user with
    /// `user.id`. Returns `None` if no such row exists.
    async fn update_by_id(&self, user: &User) -> Result<Option<User>, DirectoryError>;

    /// Same as [`UserDirectory::update_by_id`] but matched on `user.email`.
    async fn update_by_email(&self, user: &User) -> Result<Option<User>, DirectoryError>;

    async fn get_by_id(&self, id: DbId) -> Result<Option<User>, DirectoryError>;

    /// Exact, case-sensitive email match.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;

    async fn check_if_exists_by_id(&self, id: DbId) -> Result<bool, DirectoryError>;

    async fn check_if_exists_by_email(&self, email: &str) -> Result<bool, DirectoryError>;
}
