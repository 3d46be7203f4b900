//! One open time-series store per tenant.
//!
//! The registry is populated at startup from the tenant directory and grows
//! when new tenants register. Handles are only closed at shutdown, through
//! [`TenantStorageRegistry::close_all`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tsgate_core::error::CoreError;
use tsgate_core::timeseries::{StorageConfig, StoreOpener, TimeSeriesStore};
use tsgate_core::types::DbId;
use tsgate_db::TenantDirectory;

use crate::error::{AppError, AppResult};

pub struct TenantStorageRegistry {
    data_dir: PathBuf,
    config: StorageConfig,
    opener: Arc<dyn StoreOpener>,
    stores: RwLock<HashMap<DbId, Arc<dyn TimeSeriesStore>>>,
    /// Serializes opens (and `close_all`) so one tenant never gets two stores.
    open_lock: Mutex<()>,
    closed: AtomicBool,
}

impl TenantStorageRegistry {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        config: StorageConfig,
        opener: Arc<dyn StoreOpener>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            config,
            opener,
            stores: RwLock::new(HashMap::new()),
            open_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `<data_dir>/<tenant_id>`
    pub fn store_path(&self, tenant_id: DbId) -> PathBuf {
        self.data_dir.join(tenant_id.to_string())
    }

    /// Open the tenant's store, or return the one already open.
    pub async fn open(&self, tenant_id: DbId) -> Result<Arc<dyn TimeSeriesStore>, CoreError> {
        let _guard = self.open_lock.lock().await;

        if self.closed.load(Ordering::Acquire) {
            return Err(CoreError::StorageOpen {
                tenant_id,
                reason: "registry is shut down".to_string(),
            });
        }
        if let Some(existing) = self.get(tenant_id) {
            return Ok(existing);
        }

        let path = self.store_path(tenant_id);
        let store = self
            .opener
            .open(&path, &self.config)
            .await
            .map_err(|e| CoreError::StorageOpen {
                tenant_id,
                reason: e.to_string(),
            })?;

        self.stores.write().insert(tenant_id, Arc::clone(&store));
        tracing::info!(tenant_id, path = %path.display(), "Tenant store ready");
        Ok(store)
    }

    /// Open a store for every tenant the directory knows about.
    ///
    /// Stops at the first failure. Returns the number of open stores.
    pub async fn open_existing(&self, directory: &dyn TenantDirectory) -> AppResult<usize> {
        let ids = directory
            .list_all_ids()
            .await
            .map_err(AppError::directory("list_all_ids"))?;

        for tenant_id in ids {
            self.open(tenant_id).await?;
        }
        Ok(self.len())
    }

    pub fn get(&self, tenant_id: DbId) -> Option<Arc<dyn TimeSeriesStore>> {
        self.stores.read().get(&tenant_id).cloned()
    }

    /// Close and drop every store. Later opens fail; calling this again is a
    /// no-op.
    pub async fn close_all(&self) {
        let _guard = self.open_lock.lock().await;
        self.closed.store(true, Ordering::Release);

        let drained: Vec<_> = self.stores.write().drain().collect();
        for (tenant_id, store) in drained {
            match store.close().await {
                Ok(()) => tracing::info!(tenant_id, "Tenant store closed"),
                Err(e) => tracing::error!(tenant_id, error = %e, "Failed to close tenant store"),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.stores.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of tenants with an open store, ascending.
    pub fn tenant_ids(&self) -> Vec<DbId> {
        let mut ids: Vec<DbId> = self.stores.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
