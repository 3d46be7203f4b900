//! Store and directory doubles for failure-path tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tsgate_core::timeseries::{
    DataPoint, Label, Row, StorageConfig, StoreError, StoreOpener, TimeSeriesStore,
};
use tsgate_core::types::DbId;
use tsgate_db::models::user::{CreateUser, User};
use tsgate_db::{DirectoryError, UserDirectory};
use tsgate_tsdb::FileStoreOpener;

/// Opens real file stores, with optional failures injected.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOpener {
    /// Opening this tenant's store fails.
    pub refuse_tenant: Option<DbId>,
    /// Every `select` on opened stores fails.
    pub fail_selects: bool,
    /// Every `insert_rows` sleeps this long first.
    pub insert_delay: Option<Duration>,
}

#[async_trait]
impl StoreOpener for ScriptedOpener {
    async fn open(
        &self,
        path: &Path,
        config: &StorageConfig,
    ) -> Result<Arc<dyn TimeSeriesStore>, StoreError> {
        if let Some(refused) = self.refuse_tenant {
            if path.file_name().and_then(|n| n.to_str()) == Some(refused.to_string().as_str()) {
                return Err(StoreError::Open {
                    path: path.to_path_buf(),
                    reason: "disk unavailable".to_string(),
                });
            }
        }
        let inner = FileStoreOpener.open(path, config).await?;
        Ok(Arc::new(ScriptedStore {
            inner,
            fail_selects: self.fail_selects,
            insert_delay: self.insert_delay,
        }))
    }
}

struct ScriptedStore {
    inner: Arc<dyn TimeSeriesStore>,
    fail_selects: bool,
    insert_delay: Option<Duration>,
}

#[async_trait]
impl TimeSeriesStore for ScriptedStore {
    async fn insert_rows(&self, rows: &[Row]) -> Result<(), StoreError> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.insert_rows(rows).await
    }

    async fn select(
        &self,
        metric: &str,
        labels: &[Label],
        start: i64,
        end: i64,
    ) -> Result<Vec<DataPoint>, StoreError> {
        if self.fail_selects {
            return Err(StoreError::Read("partition index unreadable".to_string()));
        }
        self.inner.select(metric, labels, start, end).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.inner.close().await
    }
}

/// A user directory whose backing database is down.
pub struct UnreachableUsers;

fn down() -> DirectoryError {
    DirectoryError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl UserDirectory for UnreachableUsers {
    async fn insert(&self, _input: &CreateUser) -> Result<User, DirectoryError> {
        Err(down())
    }

    async fn update_by_id(&self, _user: &User) -> Result<Option<User>, DirectoryError> {
        Err(down())
    }

    async fn update_by_email(&self, _user: &User) -> Result<Option<User>, DirectoryError> {
        Err(down())
    }

    async fn get_by_id(&self, _id: DbId) -> Result<Option<User>, DirectoryError> {
        Err(down())
    }

    async fn get_by_email(&self, _email: &str) -> Result<Option<User>, DirectoryError> {
        Err(down())
    }

    async fn check_if_exists_by_id(&self, _id: DbId) -> Result<bool, DirectoryError> {
        Err(down())
    }

    async fn check_if_exists_by_email(&self, _email: &str) -> Result<bool, DirectoryError> {
        Err(down())
    }
}
