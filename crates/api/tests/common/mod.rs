#![allow(dead_code)]

pub mod stores;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use tsgate_api::auth::jwt::JwtConfig;
use tsgate_api::config::{ServerConfig, TsdbConfig};
use tsgate_api::registry::TenantStorageRegistry;
use tsgate_api::router::build_app_router;
use tsgate_api::session::{MemorySessionCache, SessionStore};
use tsgate_api::state::AppState;
use tsgate_core::timeseries::{StorageConfig, StoreOpener};
use tsgate_db::memory::MemoryDirectory;
use tsgate_db::UserDirectory;
use tsgate_tsdb::FileStoreOpener;

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults rooted at `data_dir`.
pub fn test_config(data_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        session_ttl_hours: 168,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry_mins: 60,
        },
        tsdb: TsdbConfig {
            data_dir: data_dir.to_path_buf(),
            storage: StorageConfig::default(),
        },
    }
}

/// The application router plus handles on its collaborators.
pub struct TestApp {
    pub router: Router,
    pub directory: Arc<MemoryDirectory>,
    pub sessions: SessionStore,
    pub registry: Arc<TenantStorageRegistry>,
    /// Kept alive so tenant stores outlive the test body.
    pub data_dir: TempDir,
}

/// Collaborator overrides for [`build_test_app_with`].
pub struct TestOptions {
    pub opener: Arc<dyn StoreOpener>,
    /// Replaces the in-memory user directory when set.
    pub users: Option<Arc<dyn UserDirectory>>,
    pub request_timeout_secs: u64,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            opener: Arc::new(FileStoreOpener),
            users: None,
            request_timeout_secs: 30,
        }
    }
}

/// Build the full application router over in-memory directories, an
/// in-process session cache and file stores in a temporary directory.
///
/// Uses [`build_app_router`] so integration tests exercise the same
/// middleware stack (interceptor, request ID, tracing, panic recovery)
/// that production uses.
pub fn build_test_app() -> TestApp {
    build_test_app_with(TestOptions::default())
}

pub fn build_test_app_with(options: TestOptions) -> TestApp {
    let data_dir = tempfile::tempdir().expect("temp dir");
    let mut config = test_config(data_dir.path());
    config.request_timeout_secs = options.request_timeout_secs;

    let directory = Arc::new(MemoryDirectory::new());
    let sessions = SessionStore::new(Arc::new(MemorySessionCache::new()));
    let registry = Arc::new(TenantStorageRegistry::new(
        config.tsdb.data_dir.clone(),
        config.tsdb.storage.clone(),
        options.opener,
    ));
    let users: Arc<dyn UserDirectory> = match options.users {
        Some(users) => users,
        None => directory.clone(),
    };

    let state = AppState {
        config: Arc::new(config),
        tenants: directory.clone(),
        users,
        sessions: sessions.clone(),
        registry: Arc::clone(&registry),
    };

    TestApp {
        router: build_app_router(state),
        directory,
        sessions,
        registry,
        data_dir,
    }
}

pub fn rpc(method: &str) -> String {
    format!("/tsgate.Gateway/{method}")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("router is infallible")
}

/// POST a JSON body to an RPC method without credentials.
pub async fn post_json(app: &Router, method: &str, body: serde_json::Value) -> Response {
    let request = Request::post(rpc(method))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST a JSON body to an RPC method with a bearer token.
pub async fn post_json_auth(
    app: &Router,
    method: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::post(rpc(method))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST an NDJSON stream to `InsertTimeSeriesData`.
pub async fn post_ndjson_auth(app: &Router, lines: &str, token: &str) -> Response {
    let request = Request::post(rpc("InsertTimeSeriesData"))
        .header("content-type", "application/x-ndjson")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(lines.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Register a company and return the `(email, password)` used.
pub async fn register(app: &Router, company: &str) -> (String, String) {
    let email = format!("admin@{}.com", company.to_lowercase());
    let password = "correct-horse-battery-staple".to_string();
    let response = post_json(
        app,
        "Register",
        serde_json::json!({
            "company": company,
            "email": email,
            "password": password,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "timezone": "UTC",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "registration should succeed");
    (email, password)
}

/// Register a company, log its admin in and return the access token.
pub async fn register_and_login(app: &Router, company: &str) -> String {
    let (email, password) = register(app, company).await;
    let response = post_json(
        app,
        "Login",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login should succeed");
    let json = body_json(response).await;
    json["access_token"]
        .as_str()
        .expect("access_token is a string")
        .to_string()
}
