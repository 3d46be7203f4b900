//! Tenant and user directories.
//!
//! - [`directory`] -- the `TenantDirectory` / `UserDirectory` capability traits.
//! - [`repositories`] -- PostgreSQL implementations backed by `sqlx`.
//! - [`memory`] -- in-process implementations used by tests and local runs.

use sqlx::postgres::PgPoolOptions;

pub mod directory;
pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;

pub use directory::{TenantDirectory, UserDirectory};
pub use error::DirectoryError;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the pool can reach the server.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
