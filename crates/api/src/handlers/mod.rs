//! RPC handlers.
//!
//! - [`auth`] -- `Register`, `Login`, `RefreshToken` (allow-listed).
//! - [`timeseries`] -- ingest and query, scoped to the caller's tenant.

pub mod auth;
pub mod timeseries;

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON request body whose rejections surface as `INVALID_ARGUMENT`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct RpcJson<T>(pub T);
