//! Per-RPC authentication gate and call log.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use tsgate_core::error::CoreError;

use crate::auth::jwt::{resolve_token, TokenError};
use crate::error::{AppError, AppResult, RpcFailure};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Path prefix shared by every RPC method.
pub const RPC_PREFIX: &str = "/tsgate.Gateway/";

/// Methods reachable without a session.
pub const ALLOW_LIST: &[&str] = &["Register", "Login", "RefreshToken"];

/// The RPC method name of a request path.
pub fn rpc_method(path: &str) -> &str {
    path.strip_prefix(RPC_PREFIX).unwrap_or(path)
}

/// Methods whose request body is a client stream. They are not bounded by
/// the request timeout so a long stream is drained to the end.
pub const STREAMING: &[&str] = &["InsertTimeSeriesData"];

/// Gate non-allow-listed methods behind a live session, then log the call.
///
/// Unary methods are bounded by `request_timeout_secs`. Timeouts and panics
/// are turned into error responses here so every call produces exactly one
/// log line.
///
/// Mounted with `axum::middleware::from_fn_with_state` on the RPC routes.
pub async fn intercept(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = rpc_method(request.uri().path()).to_string();

    let call = AssertUnwindSafe(dispatch(&state, &method, request, next)).catch_unwind();
    let outcome = if STREAMING.contains(&method.as_str()) {
        call.await
    } else {
        let limit = Duration::from_secs(state.config.request_timeout_secs);
        match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => Ok(AppError::Timeout(limit).into_response()),
        }
    };
    let response = outcome.unwrap_or_else(|panic| {
        AppError::InternalError(format!("Handler panicked: {}", panic_message(&*panic)))
            .into_response()
    });

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    match response.extensions().get::<RpcFailure>() {
        Some(RpcFailure(error)) => {
            tracing::warn!(method = %method, status, elapsed_ms, error = %error, "RPC failed")
        }
        None => tracing::info!(method = %method, status, elapsed_ms, "RPC handled"),
    }
    response
}

async fn dispatch(state: &AppState, method: &str, mut request: Request, next: Next) -> Response {
    if !ALLOW_LIST.contains(&method) {
        let authenticated = authenticate(state, request.headers()).await;
        match authenticated {
            Ok(auth) => {
                request.extensions_mut().insert(auth);
            }
            Err(err) => return err.into_response(),
        }
    }
    next.run(request).await
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

/// Split an authorization value into its token, accepting an optional
/// `Bearer` scheme in any case.
fn bearer_token(value: &str) -> &str {
    let value = value.trim();
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => value,
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> AppResult<AuthUser> {
    let value = headers.get(AUTHORIZATION).ok_or_else(|| {
        CoreError::Unauthenticated("Authorization token is not supplied".into())
    })?;
    let value = value
        .to_str()
        .map_err(|_| CoreError::InvalidArgument("Retrieving metadata failed".into()))?;
    let token = bearer_token(value);

    let session_id =
        resolve_token(state.config.jwt.secret.as_bytes(), token).map_err(|e| match e {
            TokenError::Malformed(_) => {
                CoreError::InvalidArgument("Authorization token is malformed".into())
            }
            _ => CoreError::Unauthenticated("Authorization token is invalid or expired".into()),
        })?;

    let user = state
        .sessions
        .get(session_id)
        .await
        .map_err(AppError::cache("get"))?
        .ok_or_else(|| CoreError::Unauthenticated("Session expired - please log in again".into()))?;

    Ok(AuthUser { user, session_id })
}
