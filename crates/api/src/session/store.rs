use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::cache::{CacheError, SessionCache};
use super::SessionUser;

/// Maps session ids to the [`SessionUser`] captured at login.
///
/// The cache is the only record of a session; once its entry expires or is
/// removed the session is gone.
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn SessionCache>,
}

impl SessionStore {
    pub fn new(cache: Arc<dyn SessionCache>) -> Self {
        Self { cache }
    }

    /// Store `user` under `session_id` for `ttl`, overwriting any previous
    /// snapshot.
    pub async fn put(
        &self,
        session_id: Uuid,
        user: &SessionUser,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_vec(user)?;
        self.cache.set(&session_id.to_string(), payload, ttl).await
    }

    /// Look up a live session.
    ///
    /// Unreadable payloads and snapshots without a user id count as absent.
    /// Backend failures are returned as errors.
    pub async fn get(&self, session_id: Uuid) -> Result<Option<SessionUser>, CacheError> {
        let Some(payload) = self.cache.get(&session_id.to_string()).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<SessionUser>(&payload) {
            Ok(user) if user.id != 0 => Ok(Some(user)),
            Ok(_) => {
                tracing::warn!(%session_id, "Session snapshot has no user id");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "Discarding unreadable session payload");
                Ok(None)
            }
        }
    }

    pub async fn remove(&self, session_id: Uuid) -> Result<(), CacheError> {
        self.cache.delete(&session_id.to_string()).await
    }
}
