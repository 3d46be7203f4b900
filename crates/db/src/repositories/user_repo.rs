//! Repository for the `users` table.

use async_trait::async_trait;
use tsgate_core::types::DbId;

use crate::directory::UserDirectory;
use crate::error::DirectoryError;
use crate::models::user::{CreateUser, User};
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, uuid, tenant_id, email, first_name, last_name, \
                       password_algorithm, password_hash, state, role_id, timezone, \
                       was_email_activated, pr_access_code, pr_expiry_time, \
                       created_at, modified_at";

#[derive(Clone, Copy)]
enum UpdateKey {
    Id,
    Email,
}

/// [`UserDirectory`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct UserRepo {
    pool: DbPool,
}

impl UserRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Shared body of the two update variants; `key` selects the row.
    async fn update_where(&self, key: UpdateKey, user: &User) -> Result<Option<User>, DirectoryError> {
        let key_column = match key {
            UpdateKey::Id => "id",
            UpdateKey::Email => "email",
        };
        let query = format!(
            "UPDATE users SET
                tenant_id = $1,
                email = $2,
                first_name = $3,
                last_name = $4,
                password_algorithm = $5,
                password_hash = $6,
                state = $7,
                role_id = $8,
                timezone = $9,
                was_email_activated = $10,
                pr_access_code = $11,
                pr_expiry_time = $12,
                modified_at = now()
             WHERE {key_column} = $13
             RETURNING {COLUMNS}"
        );
        let q = sqlx::query_as::<_, User>(&query)
            .bind(user.tenant_id)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_algorithm)
            .bind(&user.password_hash)
            .bind(user.state.id())
            .bind(user.role.id())
            .bind(&user.timezone)
            .bind(user.was_email_activated)
            .bind(&user.pr_access_code)
            .bind(user.pr_expiry_time);
        let q = match key {
            UpdateKey::Id => q.bind(user.id),
            UpdateKey::Email => q.bind(user.email.clone()),
        };
        Ok(q.fetch_optional(&self.pool).await?)
    }
}

#[async_trait]
impl UserDirectory for UserRepo {
    async fn insert(&self, input: &CreateUser) -> Result<User, DirectoryError> {
        let query = format!(
            "INSERT INTO users (uuid, tenant_id, email, first_name, last_name,
                                password_algorithm, password_hash, state, role_id, timezone)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(input.uuid)
            .bind(input.tenant_id)
            .bind(&input.email)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.password_algorithm)
            .bind(&input.password_hash)
            .bind(input.state.id())
            .bind(input.role.id())
            .bind(&input.timezone)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_by_id(&self, user: &User) -> Result<Option<User>, DirectoryError> {
        self.update_where(UpdateKey::Id, user).await
    }

    async fn update_by_email(&self, user: &User) -> Result<Option<User>, DirectoryError> {
        self.update_where(UpdateKey::Email, user).await
    }

    async fn get_by_id(&self, id: DbId) -> Result<Option<User>, DirectoryError> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn check_if_exists_by_id(&self, id: DbId) -> Result<bool, DirectoryError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn check_if_exists_by_email(&self, email: &str) -> Result<bool, DirectoryError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists.0)
    }
}
