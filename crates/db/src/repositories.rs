//! PostgreSQL-backed directory implementations.

mod tenant_repo;
mod user_repo;

pub use tenant_repo::TenantRepo;
pub use user_repo::UserRepo;
