pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the RPC route tree.
///
/// ```text
/// /tsgate.Gateway/Register                  create tenant + admin user (public)
/// /tsgate.Gateway/Login                     open a session (public)
/// /tsgate.Gateway/RefreshToken              not implemented (public)
/// /tsgate.Gateway/InsertTimeSeriesDatum     write one point
/// /tsgate.Gateway/InsertBulkTimeSeriesData  write an array of points
/// /tsgate.Gateway/InsertTimeSeriesData      write an NDJSON stream of points
/// /tsgate.Gateway/SelectTimeSeriesData      read a series over [start, end)
/// ```
///
/// Authentication is applied by the interceptor layered on in
/// [`crate::router::build_app_router`].
pub fn rpc_routes() -> Router<AppState> {
    Router::new()
        .route("/tsgate.Gateway/Register", post(handlers::auth::register))
        .route("/tsgate.Gateway/Login", post(handlers::auth::login))
        .route(
            "/tsgate.Gateway/RefreshToken",
            post(handlers::auth::refresh_token),
        )
        .route(
            "/tsgate.Gateway/InsertTimeSeriesDatum",
            post(handlers::timeseries::insert_datum),
        )
        .route(
            "/tsgate.Gateway/InsertBulkTimeSeriesData",
            post(handlers::timeseries::insert_bulk),
        )
        .route(
            "/tsgate.Gateway/InsertTimeSeriesData",
            post(handlers::timeseries::insert_stream),
        )
        .route(
            "/tsgate.Gateway/SelectTimeSeriesData",
            post(handlers::timeseries::select),
        )
}
