//! Request authentication.
//!
//! - [`interceptor`] -- per-RPC gate that resolves the bearer token to a
//!   session and logs every call.
//! - [`auth::AuthUser`] -- extractor handing the resolved identity to handlers.

pub mod auth;
pub mod interceptor;
