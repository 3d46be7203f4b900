//! HTTP-level tests for ingest and query RPCs.

mod common;

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::stores::ScriptedOpener;
use common::{
    body_json, build_test_app, build_test_app_with, get, post_json_auth, post_ndjson_auth,
    register_and_login, rpc, send, TestOptions,
};
use futures::StreamExt;
use serde_json::json;
use tsgate_api::handlers::timeseries::MAX_LINE_BYTES;

const T: i64 = 1_700_000_000;

async fn select_temp(app: &axum::Router, token: &str, room: &str) -> serde_json::Value {
    let response = post_json_auth(
        app,
        "SelectTimeSeriesData",
        json!({
            "metric": "temp",
            "labels": [{ "name": "room", "value": room }],
            "start": T - 1,
            "end": T + 100,
        }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn test_register_login_ingest_select_round_trip() {
    let app = build_test_app();
    let token = register_and_login(&app.router, "Acme").await;

    let response = post_json_auth(
        &app.router,
        "InsertTimeSeriesDatum",
        json!({
            "metric": "temp",
            "labels": [{ "name": "room", "value": "a" }],
            "timestamp": T,
            "value": 21.5,
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({}));

    let response = post_json_auth(
        &app.router,
        "SelectTimeSeriesData",
        json!({
            "metric": "temp",
            "labels": [{ "name": "room", "value": "a" }],
            "start": T - 1,
            "end": T + 1,
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["data_points"],
        json!([{ "timestamp": T, "value": 21.5 }])
    );
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let app = build_test_app();
    let acme = register_and_login(&app.router, "Acme").await;
    let globex = register_and_login(&app.router, "Globex").await;

    post_json_auth(
        &app.router,
        "InsertTimeSeriesDatum",
        json!({
            "metric": "temp",
            "labels": [{ "name": "room", "value": "a" }],
            "timestamp": T,
            "value": 1.0,
        }),
        &acme,
    )
    .await;

    let json = select_temp(&app.router, &globex, "a").await;
    assert_eq!(json["data_points"], json!([]));
    let json = select_temp(&app.router, &acme, "a").await;
    assert_eq!(json["data_points"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bulk_insert_writes_in_order() {
    let app = build_test_app();
    let token = register_and_login(&app.router, "Acme").await;

    let response = post_json_auth(
        &app.router,
        "InsertBulkTimeSeriesData",
        json!({
            "data": [
                { "metric": "temp", "labels": [{ "name": "room", "value": "a" }], "timestamp": T, "value": 1.0 },
                { "metric": "temp", "labels": [{ "name": "room", "value": "a" }], "timestamp": T + 1, "value": 2.0 },
            ]
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = select_temp(&app.router, &token, "a").await;
    assert_eq!(
        json["data_points"],
        json!([
            { "timestamp": T, "value": 1.0 },
            { "timestamp": T + 1, "value": 2.0 },
        ])
    );
}

#[tokio::test]
async fn test_bulk_insert_stops_at_first_failure() {
    let app = build_test_app();
    let token = register_and_login(&app.router, "Acme").await;

    let response = post_json_auth(
        &app.router,
        "InsertBulkTimeSeriesData",
        json!({
            "data": [
                { "metric": "temp", "labels": [{ "name": "room", "value": "a" }], "timestamp": T, "value": 1.0 },
                { "metric": "", "labels": [], "timestamp": T, "value": 0.0 },
                { "metric": "temp", "labels": [{ "name": "room", "value": "a" }], "timestamp": T + 2, "value": 3.0 },
            ]
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = select_temp(&app.router, &token, "a").await;
    assert_eq!(json["data_points"], json!([{ "timestamp": T, "value": 1.0 }]));
}

#[tokio::test]
async fn test_duplicate_label_names_are_rejected() {
    let app = build_test_app();
    let token = register_and_login(&app.router, "Acme").await;

    let response = post_json_auth(
        &app.router,
        "InsertTimeSeriesDatum",
        json!({
            "metric": "temp",
            "labels": [
                { "name": "room", "value": "a" },
                { "name": "room", "value": "b" },
            ],
            "timestamp": T,
            "value": 1.0,
        }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_stream_ingest_accepts_every_line() {
    let app = build_test_app();
    let token = register_and_login(&app.router, "Acme").await;

    let lines = format!(
        "{}\n\n{}\n{}",
        json!({ "metric": "temp", "labels": [{ "name": "room", "value": "a" }], "timestamp": T, "value": 1.0 }),
        json!({ "metric": "temp", "labels": [{ "name": "room", "value": "a" }], "timestamp": T + 1, "value": 2.0 }),
        json!({ "metric": "temp", "labels": [{ "name": "room", "value": "a" }], "timestamp": T + 2, "value": 3.0 }),
    );
    let response = post_ndjson_auth(&app.router, &lines, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = select_temp(&app.router, &token, "a").await;
    assert_eq!(json["data_points"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_stream_ingest_drains_past_bad_lines_and_reports_last_error() {
    let app = build_test_app();
    let token = register_and_login(&app.router, "Acme").await;

    let lines = format!(
        "{}\nthis is not json\n{}\n",
        json!({ "metric": "temp", "labels": [{ "name": "room", "value": "a" }], "timestamp": T, "value": 1.0 }),
        json!({ "metric": "temp", "labels": [{ "name": "room", "value": "a" }], "timestamp": T + 1, "value": 2.0 }),
    );
    let response = post_ndjson_auth(&app.router, &lines, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_ARGUMENT");

    let json = select_temp(&app.router, &token, "a").await;
    assert_eq!(json["data_points"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_store_is_unavailable() {
    let app = build_test_app();
    let token = register_and_login(&app.router, "Acme").await;

    // Shutting the registry down drops every handle.
    app.registry.close_all().await;

    let response = post_json_auth(
        &app.router,
        "InsertTimeSeriesDatum",
        json!({ "metric": "temp", "labels": [], "timestamp": T, "value": 1.0 }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAVAILABLE");
}

#[tokio::test]
async fn test_select_with_empty_window_returns_nothing() {
    let app = build_test_app();
    let token = register_and_login(&app.router, "Acme").await;

    let response = post_json_auth(
        &app.router,
        "SelectTimeSeriesData",
        json!({ "metric": "temp", "labels": [], "start": T + 10, "end": T }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "data_points": [] }));
}

#[tokio::test]
async fn test_health_reports_open_stores() {
    let app = build_test_app();
    register_and_login(&app.router, "Acme").await;

    let response = get(&app.router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["tenant_stores"], 1);
}

#[tokio::test]
async fn test_stream_ingest_skips_overlong_line() {
    let app = build_test_app();
    let token = register_and_login(&app.router, "Acme").await;

    let lines = format!(
        "{}\n{}\n",
        "x".repeat(MAX_LINE_BYTES + 1),
        json!({ "metric": "temp", "labels": [{ "name": "room", "value": "a" }], "timestamp": T, "value": 1.0 }),
    );
    let response = post_ndjson_auth(&app.router, &lines, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_ARGUMENT");

    let json = select_temp(&app.router, &token, "a").await;
    assert_eq!(json["data_points"], json!([{ "timestamp": T, "value": 1.0 }]));
}

#[tokio::test]
async fn test_stream_ingest_outlasts_request_timeout() {
    let app = build_test_app_with(TestOptions {
        request_timeout_secs: 3,
        ..TestOptions::default()
    });
    let token = register_and_login(&app.router, "Acme").await;

    // Five lines at 800ms apiece keep the stream open past the deadline.
    let lines: Vec<String> = (0..5)
        .map(|i| {
            let datum = json!({
                "metric": "temp",
                "labels": [{ "name": "room", "value": "a" }],
                "timestamp": T + i,
                "value": 1.0,
            });
            format!("{datum}\n")
        })
        .collect();
    let body = Body::from_stream(futures::stream::iter(lines).then(|line| async move {
        tokio::time::sleep(Duration::from_millis(800)).await;
        Ok::<_, Infallible>(line)
    }));
    let request = Request::post(rpc("InsertTimeSeriesData"))
        .header("content-type", "application/x-ndjson")
        .header("authorization", format!("Bearer {token}"))
        .body(body)
        .unwrap();
    let response = send(&app.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = select_temp(&app.router, &token, "a").await;
    assert_eq!(json["data_points"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_slow_unary_call_hits_deadline() {
    let app = build_test_app_with(TestOptions {
        opener: Arc::new(ScriptedOpener {
            insert_delay: Some(Duration::from_secs(5)),
            ..ScriptedOpener::default()
        }),
        request_timeout_secs: 3,
        ..TestOptions::default()
    });
    let token = register_and_login(&app.router, "Acme").await;

    let response = post_json_auth(
        &app.router,
        "InsertTimeSeriesDatum",
        json!({ "metric": "temp", "labels": [], "timestamp": T, "value": 1.0 }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "DEADLINE_EXCEEDED");
}

#[tokio::test]
async fn test_query_engine_error_yields_empty_result() {
    let app = build_test_app_with(TestOptions {
        opener: Arc::new(ScriptedOpener {
            fail_selects: true,
            ..ScriptedOpener::default()
        }),
        ..TestOptions::default()
    });
    let token = register_and_login(&app.router, "Acme").await;

    post_json_auth(
        &app.router,
        "InsertTimeSeriesDatum",
        json!({
            "metric": "temp",
            "labels": [{ "name": "room", "value": "a" }],
            "timestamp": T,
            "value": 1.0,
        }),
        &token,
    )
    .await;

    let json = select_temp(&app.router, &token, "a").await;
    assert_eq!(json, json!({ "data_points": [] }));
}
