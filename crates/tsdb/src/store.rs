use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tsgate_core::timeseries::{
    canonical_labels, DataPoint, Label, Row, StorageConfig, StoreError, StoreOpener,
    TimeSeriesStore,
};

/// Name of the write-ahead log inside a store directory.
pub const WAL_FILE_NAME: &str = "wal.jsonl";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SeriesKey {
    metric: String,
    labels: Vec<Label>,
}

impl SeriesKey {
    fn new(metric: &str, labels: &[Label]) -> Self {
        Self {
            metric: metric.to_string(),
            labels: canonical_labels(labels),
        }
    }
}

/// Series -> partition number -> samples in arrival order.
type Index = HashMap<SeriesKey, BTreeMap<i64, Vec<DataPoint>>>;

struct Wal {
    file: File,
    /// End of the last acknowledged record.
    len: u64,
    /// A failed append may have left bytes past `len`.
    torn: bool,
}

impl Wal {
    async fn append(&mut self, buf: &[u8], timeout: Duration) -> Result<(), StoreError> {
        if self.torn {
            self.rollback().await?;
        }

        let file = &mut self.file;
        let write = async {
            file.write_all(buf).await?;
            file.flush().await
        };
        let result = match tokio::time::timeout(timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(StoreError::Write(e.to_string())),
            Err(_) => Err(StoreError::WriteTimeout(timeout)),
        };

        if result.is_ok() {
            self.len += buf.len() as u64;
        } else {
            self.torn = true;
            if let Err(e) = self.rollback().await {
                tracing::warn!(error = %e, "WAL rollback failed, retrying before next append");
            }
        }
        result
    }

    /// Cut the log back to the last acknowledged record.
    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.file
            .set_len(self.len)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        self.torn = false;
        Ok(())
    }
}

/// A single tenant's store. See the crate docs for the on-disk layout.
pub struct FileStore {
    path: PathBuf,
    partition_secs: i64,
    write_timeout: Duration,
    index: RwLock<Index>,
    /// `None` once the store has been closed.
    wal: Mutex<Option<Wal>>,
    closed: AtomicBool,
}

impl FileStore {
    /// Open (or create) the store rooted at `path` and replay its log.
    pub async fn open(path: &Path, config: &StorageConfig) -> Result<Self, StoreError> {
        let open_err = |reason: String| StoreError::Open {
            path: path.to_path_buf(),
            reason,
        };

        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| open_err(e.to_string()))?;

        let partition_secs = i64::try_from(config.partition_duration.as_secs())
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| open_err("partition duration must be at least one second".into()))?;

        let wal_path = path.join(WAL_FILE_NAME);
        let mut index = Index::new();
        let contents = match tokio::fs::read(&wal_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(open_err(e.to_string())),
        };

        // Only newline-terminated records were ever acknowledged.
        let committed = contents
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |pos| pos + 1);
        let mut skipped = 0usize;
        for line in contents[..committed].split(|b| *b == b'\n') {
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_slice::<Row>(line) {
                Ok(row) => index_row(&mut index, partition_secs, &row),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!(path = %wal_path.display(), skipped, "Skipped unreadable WAL records");
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&wal_path)
            .await
            .map_err(|e| open_err(e.to_string()))?;

        let torn = contents.len() - committed;
        if torn > 0 {
            tracing::warn!(path = %wal_path.display(), bytes = torn, "Dropping truncated WAL tail");
            file.set_len(committed as u64)
                .await
                .map_err(|e| open_err(e.to_string()))?;
        }

        tracing::debug!(path = %path.display(), series = index.len(), "Store opened");

        Ok(Self {
            path: path.to_path_buf(),
            partition_secs,
            write_timeout: config.write_timeout,
            index: RwLock::new(index),
            wal: Mutex::new(Some(Wal {
                file,
                len: committed as u64,
                torn: false,
            })),
            closed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn index_row(index: &mut Index, partition_secs: i64, row: &Row) {
    let partition = row.data_point.timestamp.div_euclid(partition_secs);
    index
        .entry(SeriesKey::new(&row.metric, &row.labels))
        .or_default()
        .entry(partition)
        .or_default()
        .push(row.data_point);
}

#[async_trait]
impl TimeSeriesStore for FileStore {
    async fn insert_rows(&self, rows: &[Row]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        for row in rows {
            if row.metric.is_empty() {
                return Err(StoreError::Write("metric name must not be empty".into()));
            }
            serde_json::to_writer(&mut buf, row).map_err(|e| StoreError::Write(e.to_string()))?;
            buf.push(b'\n');
        }

        let mut wal = self.wal.lock().await;
        wal.as_mut()
            .ok_or(StoreError::Closed)?
            .append(&buf, self.write_timeout)
            .await?;

        // Index while still holding the WAL lock so in-memory order matches
        // log order.
        let mut index = self.index.write();
        for row in rows {
            index_row(&mut index, self.partition_secs, row);
        }
        Ok(())
    }

    async fn select(
        &self,
        metric: &str,
        labels: &[Label],
        start: i64,
        end: i64,
    ) -> Result<Vec<DataPoint>, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        if start >= end {
            return Ok(Vec::new());
        }

        let first = start.div_euclid(self.partition_secs);
        let last = (end - 1).div_euclid(self.partition_secs);

        let index = self.index.read();
        let Some(partitions) = index.get(&SeriesKey::new(metric, labels)) else {
            return Ok(Vec::new());
        };

        let mut points: Vec<DataPoint> = partitions
            .range(first..=last)
            .flat_map(|(_, samples)| samples.iter())
            .filter(|p| p.timestamp >= start && p.timestamp < end)
            .copied()
            .collect();
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut wal = self.wal.lock().await;
        self.closed.store(true, Ordering::Release);
        if let Some(Wal { mut file, .. }) = wal.take() {
            file.flush()
                .await
                .map_err(|e| StoreError::Write(e.to_string()))?;
            file.sync_all()
                .await
                .map_err(|e| StoreError::Write(e.to_string()))?;
            tracing::debug!(path = %self.path.display(), "Store closed");
        }
        Ok(())
    }
}

/// [`StoreOpener`] producing [`FileStore`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStoreOpener;

#[async_trait]
impl StoreOpener for FileStoreOpener {
    async fn open(
        &self,
        path: &Path,
        config: &StorageConfig,
    ) -> Result<Arc<dyn TimeSeriesStore>, StoreError> {
        let store = FileStore::open(path, config).await?;
        Ok(Arc::new(store))
    }
}
