#![warn(missing_docs)]
//! File-backed key-value store for `markup-history`.
//!
//! [`JsonFileStore`] keeps the saved histories of one or more documents in a single JSON
//! object on disk. Values are buffered in memory and written on [`JsonFileStore::flush`].
//!
//! ```rust,no_run
//! use markup_history::{HistoryManager, MarkupBuffer};
//! use markup_history_store::JsonFileStore;
//!
//! let mut manager = HistoryManager::new(MarkupBuffer::new("<p>hello</p>"));
//! manager.edit(8, 8, " world").unwrap();
//!
//! let mut store = JsonFileStore::open("history.json")?;
//! manager.store(&mut store, "notes/today");
//! store.flush()?;
//! # Ok::<(), markup_history_store::StoreError>(())
//! ```

use markup_history::{KeyValueStore, MemoryStore};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while loading or writing a store file.
pub enum StoreError {
    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    /// The file is not a flat JSON object of strings and integers.
    Json(#[from] serde_json::Error),
}

/// Key-value store persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: MemoryStore,
    dirty: bool,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(err) if err.kind() == ErrorKind::NotFound => MemoryStore::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened history store");
        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Buffered entries.
    pub fn entries(&self) -> &MemoryStore {
        &self.entries
    }

    /// Whether there are writes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the entries to disk if anything changed since the last flush.
    ///
    /// The file is replaced atomically: the JSON is written next to it and renamed over it.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), keys = self.entries.len(), "flushed history store");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn put_string(&mut self, key: &str, value: &str) {
        self.entries.put_string(key, value);
        self.dirty = true;
    }

    fn put_int(&mut self, key: &str, value: i64) {
        self.entries.put_int(key, value);
        self.dirty = true;
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.entries.get_string(key)
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.entries.get_int(key)
    }
}
