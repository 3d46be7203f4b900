use crate::types::DbId;

/// Domain-level error taxonomy shared by every crate in the workspace.
///
/// The API layer maps each variant onto an RPC status; see
/// `tsgate_api::error::AppError`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Missing, invalid or expired credentials, token or session.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Malformed metadata, token or request payload.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Duplicate company name or email.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No storage handle is registered for the tenant. Transient: either the
    /// tenant is unknown or its store failed to open during registration.
    #[error("Storage unavailable for tenant {tenant_id}")]
    StorageUnavailable { tenant_id: DbId },

    /// The storage engine refused to open the tenant's store.
    #[error("Failed to open storage for tenant {tenant_id}: {reason}")]
    StorageOpen { tenant_id: DbId, reason: String },

    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
