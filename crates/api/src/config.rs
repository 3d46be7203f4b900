use std::path::PathBuf;
use std::time::Duration;

use tsgate_core::timeseries::StorageConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `50051`).
    pub port: u16,
    /// Deadline for unary RPCs in seconds (default: `30`). Streamed ingest is
    /// not bounded.
    pub request_timeout_secs: u64,
    /// Upper bound on post-shutdown cleanup in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// How long a login session stays valid, in hours (default: `168`).
    pub session_ttl_hours: u64,
    /// Token configuration (secret, access expiry).
    pub jwt: JwtConfig,
    /// Tenant storage location and engine options.
    pub tsdb: TsdbConfig,
}

/// Where tenant stores live and how they are opened.
#[derive(Debug, Clone)]
pub struct TsdbConfig {
    /// Parent directory; each tenant gets `<data_dir>/<tenant_id>`.
    pub data_dir: PathBuf,
    pub storage: StorageConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: &str) -> T {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>()))
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default     |
    /// |---------------------------|-------------|
    /// | `HOST`                    | `127.0.0.1` |
    /// | `PORT`                    | `50051`     |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`        |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`        |
    /// | `SESSION_TTL_HOURS`       | `168`       |
    /// | `TSDB_DATA_DIR`           | `tsdb`      |
    /// | `TSDB_PARTITION_HOURS`    | `24`        |
    /// | `TSDB_WRITE_TIMEOUT_SECS` | `60`        |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`]. `DATABASE_URL` and
    /// `REDIS_URL` are read by the binary.
    ///
    /// # Panics
    ///
    /// Panics if a variable is set but cannot be parsed, or if `JWT_SECRET`
    /// is missing.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port: u16 = env_or("PORT", "50051");
        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30");
        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", "30");
        let session_ttl_hours: u64 = env_or("SESSION_TTL_HOURS", "168");

        let data_dir = PathBuf::from(std::env::var("TSDB_DATA_DIR").unwrap_or_else(|_| "tsdb".into()));
        let partition_hours: u64 = env_or("TSDB_PARTITION_HOURS", "24");
        let write_timeout_secs: u64 = env_or("TSDB_WRITE_TIMEOUT_SECS", "60");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            request_timeout_secs,
            shutdown_timeout_secs,
            session_ttl_hours,
            jwt,
            tsdb: TsdbConfig {
                data_dir,
                storage: StorageConfig {
                    partition_duration: Duration::from_secs(partition_hours * 60 * 60),
                    write_timeout: Duration::from_secs(write_timeout_secs),
                },
            },
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_hours * 60 * 60)
    }
}
