//! Session-bound token issuing and resolution.
//!
//! Tokens are HS256-signed JWTs whose only meaningful claim is the issuer,
//! which carries the session id. A token never names a user directly, so
//! dropping the session is enough to revoke every token issued for it.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extra lifetime a refresh token gets on top of the access token.
pub const REFRESH_GRACE_DAYS: i64 = 7;

/// Default access token expiry in minutes (one week).
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 7 * 24 * 60;

/// Claims embedded in both access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Issuer -- the session id.
    pub iss: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Configuration for token issuing and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 10080).
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// Load token configuration from environment variables.
    ///
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `JWT_SECRET`             | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS` | no       | `10080` |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_expiry_mins)
    }
}

/// An access token and its matching refresh token.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Why a token could not be resolved to a session id.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Signature or algorithm did not check out.
    #[error("token signature is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,

    /// Not a structurally valid token: bad segments, encoding, claims, or an
    /// issuer that is not a session id.
    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token could not be signed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

fn sign(secret: &[u8], claims: &Claims) -> Result<String, TokenError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(TokenError::Signing)
}

/// Issue an access/refresh pair bound to `session_id`.
///
/// The access token expires after `access_ttl`; the refresh token
/// [`REFRESH_GRACE_DAYS`] later.
pub fn issue_token_pair(
    secret: &[u8],
    session_id: Uuid,
    access_ttl: Duration,
) -> Result<TokenPair, TokenError> {
    let now = Utc::now();
    let iss = session_id.to_string();

    let access = Claims {
        iss: iss.clone(),
        exp: (now + access_ttl).timestamp(),
    };
    let refresh = Claims {
        iss,
        exp: (now + access_ttl + Duration::days(REFRESH_GRACE_DAYS)).timestamp(),
    };

    Ok(TokenPair {
        access_token: sign(secret, &access)?,
        refresh_token: sign(secret, &refresh)?,
    })
}

/// Verify `token` and return the session id it was issued for.
///
/// Expiry is checked with zero leeway.
pub fn resolve_token(secret: &[u8], token: &str) -> Result<Uuid, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "iss"]);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation).map_err(
        |e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::ImmatureSignature => TokenError::Invalid,
            _ => TokenError::Malformed(e.to_string()),
        },
    )?;

    Uuid::parse_str(&data.claims.iss)
        .map_err(|_| TokenError::Malformed("issuer is not a session id".into()))
}
