//! Time-series data model and the storage-engine capability traits.
//!
//! Every tenant owns exactly one [`TimeSeriesStore`]. Stores are opened
//! through a [`StoreOpener`] so the engine can be swapped without touching
//! the tenant registry.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single `name=value` label attached to a point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A `(timestamp, value)` sample. Timestamps are Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: i64,
    pub value: f64,
}

/// One accepted point: metric, label set and sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub metric: String,
    pub labels: Vec<Label>,
    pub data_point: DataPoint,
}

/// Engine options applied when a tenant store is opened.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Width of one in-engine partition (default: 24 hours).
    pub partition_duration: Duration,
    /// Upper bound on a single write before it fails (default: 60 seconds).
    pub write_timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            partition_duration: Duration::from_secs(24 * 60 * 60),
            write_timeout: Duration::from_secs(60),
        }
    }
}

/// Errors raised by a storage engine.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot open store at {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("write failed: {0}")]
    Write(String),

    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    #[error("read failed: {0}")]
    Read(String),

    #[error("store is closed")]
    Closed,
}

/// An open per-tenant time-series store.
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Append rows. Rows are accepted as given; no deduplication.
    async fn insert_rows(&self, rows: &[Row]) -> Result<(), StoreError>;

    /// Return the samples of the series identified by `metric` and the exact
    /// label set `labels` whose timestamps fall in `[start, end)`, ordered by
    /// timestamp.
    async fn select(
        &self,
        metric: &str,
        labels: &[Label],
        start: i64,
        end: i64,
    ) -> Result<Vec<DataPoint>, StoreError>;

    /// Flush and release the store. Closing an already-closed store is a no-op.
    async fn close(&self) -> Result<(), StoreError>;
}

/// Opens stores at a tenant-scoped location.
#[async_trait]
pub trait StoreOpener: Send + Sync {
    async fn open(
        &self,
        path: &Path,
        config: &StorageConfig,
    ) -> Result<Arc<dyn TimeSeriesStore>, StoreError>;
}

/// Check that label names are unique within one point.
///
/// Returns the first duplicated name on failure.
pub fn validate_labels(labels: &[Label]) -> Result<(), String> {
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if label.name.is_empty() {
            return Err("Label name must not be empty".to_string());
        }
        if !seen.insert(label.name.as_str()) {
            return Err(format!("Duplicate label name '{}'", label.name));
        }
    }
    Ok(())
}

/// Canonical (order-independent) form of a label set, used as part of a
/// series key.
pub fn canonical_labels(labels: &[Label]) -> Vec<Label> {
    let mut sorted = labels.to_vec();
    sorted.sort();
    sorted
}
