use std::sync::Arc;

use tsgate_db::{TenantDirectory, UserDirectory};

use crate::config::ServerConfig;
use crate::registry::TenantStorageRegistry;
use crate::session::SessionStore;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub tenants: Arc<dyn TenantDirectory>,
    pub users: Arc<dyn UserDirectory>,
    pub sessions: SessionStore,
    /// Open tenant stores. Closed by the binary after the server stops.
    pub registry: Arc<TenantStorageRegistry>,
}
