//! Handlers for `Register`, `Login` and `RefreshToken`.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tsgate_core::error::CoreError;
use tsgate_core::roles::{LifecycleState, Role};
use tsgate_db::models::tenant::CreateTenant;
use tsgate_db::models::user::CreateUser;
use tsgate_db::DirectoryError;
use uuid::Uuid;

use crate::auth::jwt::issue_token_pair;
use crate::auth::password::{hash_password, verify_password, PASSWORD_ALGORITHM};
use crate::error::{AppError, AppResult};
use crate::handlers::RpcJson;
use crate::session::SessionUser;
use crate::state::AppState;

/// Every login failure carries this message, whatever the cause.
pub const LOGIN_FAILED: &str = "Email or password are incorrect";

const DEFAULT_TIMEZONE: &str = "UTC";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub company: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub timezone: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Map a uniqueness violation to `Conflict`, anything else to a directory
/// failure for `op`.
fn conflict_or(op: &'static str) -> impl FnOnce(DirectoryError) -> AppError {
    move |e| match e {
        DirectoryError::Duplicate(constraint) => AppError::Core(CoreError::Conflict(format!(
            "Duplicate value violates unique constraint: {constraint}"
        ))),
        source => AppError::Directory { op, source },
    }
}

/// POST /tsgate.Gateway/Register
///
/// Create a tenant, its first (admin) user, and the tenant's store.
/// The steps are not transactional: a tenant whose store fails to open stays
/// registered and reports storage as unavailable until it is opened.
pub async fn register(
    State(state): State<AppState>,
    RpcJson(input): RpcJson<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    let company = input.company.trim();
    let email = input.email.trim();
    let password = input.password.trim();
    if company.is_empty() || email.is_empty() || password.is_empty() {
        return Err(CoreError::InvalidArgument(
            "Company, email and password are required".into(),
        )
        .into());
    }
    let timezone = match input.timezone.trim() {
        "" => DEFAULT_TIMEZONE,
        tz => tz,
    };

    if state
        .tenants
        .check_if_exists_by_name(company)
        .await
        .map_err(AppError::directory("check_if_exists_by_name"))?
    {
        return Err(CoreError::Conflict("Company is already registered".into()).into());
    }
    if state
        .users
        .check_if_exists_by_email(email)
        .await
        .map_err(AppError::directory("check_if_exists_by_email"))?
    {
        return Err(CoreError::Conflict("Email is already registered".into()).into());
    }

    let password_hash = hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let tenant = state
        .tenants
        .insert(&CreateTenant::active(company, timezone))
        .await
        .map_err(conflict_or("insert_tenant"))?;

    let user = state
        .users
        .insert(&CreateUser {
            uuid: Uuid::new_v4(),
            tenant_id: tenant.id,
            email: email.to_string(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            password_algorithm: PASSWORD_ALGORITHM.to_string(),
            password_hash,
            state: LifecycleState::Active,
            role: Role::TenantAdmin,
            timezone: timezone.to_string(),
        })
        .await
        .map_err(conflict_or("insert_user"))?;

    state.registry.open(tenant.id).await?;

    tracing::info!(tenant_id = tenant.id, user_id = user.id, "Tenant registered");

    Ok(Json(RegisterResponse {
        message: "Registration successful".to_string(),
    }))
}

fn login_failed() -> AppError {
    AppError::Core(CoreError::Unauthenticated(LOGIN_FAILED.into()))
}

/// POST /tsgate.Gateway/Login
///
/// Verify credentials, open a session and return a token pair bound to it.
pub async fn login(
    State(state): State<AppState>,
    RpcJson(input): RpcJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let email = input.email.trim();
    let password = input.password.trim();

    let user = state
        .users
        .get_by_email(email)
        .await
        .map_err(AppError::directory("get_by_email"))?
        .ok_or_else(login_failed)?;

    if !user.state.is_active() {
        tracing::debug!(user_id = user.id, "Login attempt for inactive user");
        return Err(login_failed());
    }

    match verify_password(password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return Err(login_failed()),
        Err(e) => {
            tracing::warn!(user_id = user.id, error = %e, "Stored password hash is unusable");
            return Err(login_failed());
        }
    }

    let session_id = Uuid::new_v4();
    state
        .sessions
        .put(session_id, &SessionUser::from(&user), state.config.session_ttl())
        .await
        .map_err(AppError::cache("put"))?;

    let tokens = issue_token_pair(
        state.config.jwt.secret.as_bytes(),
        session_id,
        state.config.jwt.access_ttl(),
    )
    .map_err(|e| AppError::InternalError(format!("Token signing error: {e}")))?;

    tracing::info!(user_id = user.id, tenant_id = user.tenant_id, "User logged in");

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// POST /tsgate.Gateway/RefreshToken
pub async fn refresh_token() -> AppResult<Json<LoginResponse>> {
    Err(CoreError::Unimplemented("RefreshToken is not implemented".into()).into())
}
