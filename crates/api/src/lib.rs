//! tsgate API server library.
//!
//! Exposes the building blocks (config, state, tokens, sessions, tenant
//! storage registry, interceptor, handlers, router) so integration tests and
//! the binary entrypoint share them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod registry;
pub mod router;
pub mod routes;
pub mod session;
pub mod state;
