//! Repository for the `tenants` table.

use async_trait::async_trait;
use tsgate_core::types::DbId;
use uuid::Uuid;

use crate::directory::TenantDirectory;
use crate::error::DirectoryError;
use crate::models::tenant::{CreateTenant, Tenant};
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, uuid, name, state, timezone, created_at, modified_at";

/// [`TenantDirectory`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct TenantRepo {
    pool: DbPool,
}

impl TenantRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for TenantRepo {
    async fn insert(&self, input: &CreateTenant) -> Result<Tenant, DirectoryError> {
        let query = format!(
            "INSERT INTO tenants (uuid, name, state, timezone)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let tenant = sqlx::query_as::<_, Tenant>(&query)
            .bind(input.uuid)
            .bind(&input.name)
            .bind(input.state.id())
            .bind(&input.timezone)
            .fetch_one(&self.pool)
            .await?;
        Ok(tenant)
    }

    async fn update_by_id(&self, tenant: &Tenant) -> Result<Option<Tenant>, DirectoryError> {
        let query = format!(
            "UPDATE tenants SET
                name = $2,
                state = $3,
                timezone = $4,
                modified_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Tenant>(&query)
            .bind(tenant.id)
            .bind(&tenant.name)
            .bind(tenant.state.id())
            .bind(&tenant.timezone)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn get_by_id(&self, id: DbId) -> Result<Option<Tenant>, DirectoryError> {
        let query = format!("SELECT {COLUMNS} FROM tenants WHERE id = $1");
        let tenant = sqlx::query_as::<_, Tenant>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    async fn get_by_uuid(&self, uuid: Uuid) -> Result<Option<Tenant>, DirectoryError> {
        let query = format!("SELECT {COLUMNS} FROM tenants WHERE uuid = $1");
        let tenant = sqlx::query_as::<_, Tenant>(&query)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    async fn check_if_exists_by_id(&self, id: DbId) -> Result<bool, DirectoryError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM tenants WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn check_if_exists_by_name(&self, name: &str) -> Result<bool, DirectoryError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM tenants WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists.0)
    }

    async fn list_all_ids(&self) -> Result<Vec<DbId>, DirectoryError> {
        let ids = sqlx::query_scalar::<_, DbId>("SELECT id FROM tenants ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn list_all_uuids(&self) -> Result<Vec<Uuid>, DirectoryError> {
        let uuids = sqlx::query_scalar::<_, Uuid>("SELECT uuid FROM tenants ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(uuids)
    }
}
