use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tsgate_core::error::CoreError;
use tsgate_core::timeseries::StoreError;
use tsgate_db::DirectoryError;

use crate::session::CacheError;

/// Application-level error type for RPC handlers.
///
/// Wraps [`CoreError`] for domain errors and tags capability failures with
/// the operation that raised them. Implements [`IntoResponse`] to produce
/// consistent `{ "error", "code" }` JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `tsgate_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Directory {op} failed: {source}")]
    Directory {
        op: &'static str,
        #[source]
        source: DirectoryError,
    },

    #[error("Session cache {op} failed: {source}")]
    Cache {
        op: &'static str,
        #[source]
        source: CacheError,
    },

    #[error("Storage {op} failed: {source}")]
    Store {
        op: &'static str,
        #[source]
        source: StoreError,
    },

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Call exceeded its {0:?} deadline")]
    Timeout(std::time::Duration),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn directory(op: &'static str) -> impl FnOnce(DirectoryError) -> Self {
        move |source| AppError::Directory { op, source }
    }

    pub fn cache(op: &'static str) -> impl FnOnce(CacheError) -> Self {
        move |source| AppError::Cache { op, source }
    }

    pub fn store(op: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| AppError::Store { op, source }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// The full, unsanitized error text of a failed RPC.
///
/// Attached to every error response's extensions so the interceptor can log
/// what actually happened while the client only sees the sanitized message.
#[derive(Debug, Clone)]
pub struct RpcFailure(pub String);

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Unauthenticated(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg.clone())
                }
                CoreError::InvalidArgument(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "ALREADY_EXISTS", msg.clone()),
                CoreError::StorageUnavailable { .. } | CoreError::StorageOpen { .. } => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "UNAVAILABLE",
                    "Tenant storage is unavailable".to_string(),
                ),
                CoreError::Unimplemented(msg) => {
                    (StatusCode::NOT_IMPLEMENTED, "UNIMPLEMENTED", msg.clone())
                }
                CoreError::Internal(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    INTERNAL_MESSAGE.to_string(),
                ),
            },

            AppError::Store {
                source: StoreError::Closed,
                ..
            } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UNAVAILABLE",
                "Tenant storage is unavailable".to_string(),
            ),

            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.clone())
            }

            AppError::Timeout(_) => (
                StatusCode::REQUEST_TIMEOUT,
                "DEADLINE_EXCEEDED",
                "Request took too long".to_string(),
            ),

            AppError::Directory { .. }
            | AppError::Cache { .. }
            | AppError::Store { .. }
            | AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                INTERNAL_MESSAGE.to_string(),
            ),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        let mut response = (status, axum::Json(body)).into_response();
        response.extensions_mut().insert(RpcFailure(self.to_string()));
        response
    }
}
