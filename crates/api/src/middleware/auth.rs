//! Authenticated-identity extractor for RPC handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tsgate_core::error::CoreError;
use tsgate_core::types::DbId;
use uuid::Uuid;

use crate::error::AppError;
use crate::session::SessionUser;

/// The caller behind an authenticated RPC.
///
/// Inserted into the request extensions by the interceptor; take it as a
/// handler argument:
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(tenant_id = auth.tenant_id(), "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: SessionUser,
    pub session_id: Uuid,
}

impl AuthUser {
    pub fn tenant_id(&self) -> DbId {
        self.user.tenant_id
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only reachable without an identity if a route skipped the interceptor.
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            AppError::Core(CoreError::Unauthenticated(
                "Authorization token is not supplied".into(),
            ))
        })
    }
}
