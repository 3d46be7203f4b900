//! File-backed time-series engine used for per-tenant stores.
//!
//! Each store lives in its own directory. Accepted rows are appended to a
//! JSON-lines write-ahead log (`wal.jsonl`) and indexed in memory, bucketed by
//! series and partition. Opening a directory replays its log, so reopening
//! after a restart yields the same data.

mod store;

pub use store::{FileStore, FileStoreOpener, WAL_FILE_NAME};
