use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Number of open tenant stores.
    pub tenant_stores: usize,
}

/// GET /health -- returns service status and open tenant store count.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        tenant_stores: state.registry.len(),
    })
}

/// Mount health check routes (outside the RPC surface, never intercepted).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
