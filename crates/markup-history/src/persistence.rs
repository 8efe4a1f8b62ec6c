//! Saving and restoring a [`HistoryLog`] through a key-value store.
//!
//! Layout under a key prefix `p`:
//!
//! | key            | value                                         |
//! |----------------|-----------------------------------------------|
//! | `p.hash`       | fingerprint of the prefix and buffer content  |
//! | `p.maxSize`    | size bound, `-1` when unbounded               |
//! | `p.position`   | cursor                                        |
//! | `p.size`       | number of records                             |
//! | `p.{i}.start`  | start offset of record `i`                    |
//! | `p.{i}.before` | replaced text of record `i`                   |
//! | `p.{i}.after`  | replacing text of record `i`                  |
//!
//! The fingerprint covers the buffer content, so a history is only restored onto the text it
//! was saved with. The `reconciled` flag is not stored; restored records are reconciled again
//! on the next undo.

use crate::log::HistoryLog;
use crate::record::EditRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Ordered key → string/int store.
pub trait KeyValueStore {
    /// Store a string value.
    fn put_string(&mut self, key: &str, value: &str);

    /// Store an integer value.
    fn put_int(&mut self, key: &str, value: i64);

    /// Read a string value; `None` if absent or not a string.
    fn get_string(&self, key: &str) -> Option<String>;

    /// Read an integer value; `None` if absent or not an integer.
    fn get_int(&self, key: &str) -> Option<i64>;
}

/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    /// Integer value
    Int(i64),
    /// String value
    Str(String),
}

/// In-memory [`KeyValueStore`]. Serializes as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    entries: BTreeMap<String, StoreValue>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a raw value.
    pub fn get(&self, key: &str) -> Option<&StoreValue> {
        self.entries.get(key)
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<StoreValue> {
        self.entries.remove(key)
    }

    /// Iterate over keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoreValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl KeyValueStore for MemoryStore {
    fn put_string(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_string(), StoreValue::Str(value.to_string()));
    }

    fn put_int(&mut self, key: &str, value: i64) {
        self.entries.insert(key.to_string(), StoreValue::Int(value));
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.entries.get(key)? {
            StoreValue::Str(value) => Some(value.clone()),
            StoreValue::Int(_) => None,
        }
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        match self.entries.get(key)? {
            StoreValue::Int(value) => Some(*value),
            StoreValue::Str(_) => None,
        }
    }
}

/// Errors produced by [`restore_history`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    #[error("stored history does not match the current buffer")]
    /// The fingerprint differs from the one computed for the current buffer.
    FingerprintMismatch,

    #[error("stored history is missing `{0}`")]
    /// A required key is absent or has the wrong type.
    MissingField(String),

    #[error("stored history has an invalid `{key}`: {value}")]
    /// A stored number is out of range.
    InvalidField {
        /// Offending key
        key: String,
        /// Stored value
        value: i64,
    },
}

/// Result of a successful restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing was stored under the prefix; the log is empty.
    Empty,
    /// The log was restored.
    Restored {
        /// Number of restored records
        records: usize,
    },
}

/// Fingerprint of a key prefix and the buffer content it belongs to.
pub fn fingerprint(prefix: &str, content: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(prefix.as_bytes());
    hasher.update(&[0]);
    hasher.update(content.as_bytes());
    hasher.finalize().to_hex().to_string()
}

fn to_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Write `log` under `prefix`. `content` is the current buffer text.
pub fn store_history(log: &HistoryLog, store: &mut dyn KeyValueStore, prefix: &str, content: &str) {
    store.put_string(&format!("{prefix}.hash"), &fingerprint(prefix, content));
    store.put_int(
        &format!("{prefix}.maxSize"),
        log.max_size().map_or(-1, to_int),
    );
    store.put_int(&format!("{prefix}.position"), to_int(log.cursor()));
    store.put_int(&format!("{prefix}.size"), to_int(log.len()));

    for (i, record) in log.records().iter().enumerate() {
        let key = format!("{prefix}.{i}");
        store.put_int(&format!("{key}.start"), to_int(record.start));
        store.put_string(&format!("{key}.before"), &record.before);
        store.put_string(&format!("{key}.after"), &record.after);
    }
    tracing::debug!(prefix, records = log.len(), "stored history");
}

/// Replace `log` with the history stored under `prefix`.
///
/// On error the log is left empty.
pub fn restore_history(
    log: &mut HistoryLog,
    store: &dyn KeyValueStore,
    prefix: &str,
    content: &str,
) -> Result<RestoreOutcome, RestoreError> {
    let result = read_history(store, prefix, content);
    match result {
        Ok(Some(restored)) => {
            let records = restored.len();
            *log = restored;
            tracing::debug!(prefix, records, "restored history");
            Ok(RestoreOutcome::Restored { records })
        }
        Ok(None) => {
            log.clear();
            Ok(RestoreOutcome::Empty)
        }
        Err(err) => {
            log.clear();
            tracing::warn!(prefix, error = %err, "discarding stored history");
            Err(err)
        }
    }
}

fn read_history(
    store: &dyn KeyValueStore,
    prefix: &str,
    content: &str,
) -> Result<Option<HistoryLog>, RestoreError> {
    let Some(hash) = store.get_string(&format!("{prefix}.hash")) else {
        return Ok(None);
    };
    if hash != fingerprint(prefix, content) {
        return Err(RestoreError::FingerprintMismatch);
    }

    let max_size = match read_int(store, &format!("{prefix}.maxSize"))? {
        -1 => None,
        _ => Some(read_count(store, &format!("{prefix}.maxSize"))?),
    };
    let count = read_count(store, &format!("{prefix}.size"))?;
    let cursor = read_count(store, &format!("{prefix}.position"))?;
    if cursor > count {
        return Err(RestoreError::InvalidField {
            key: format!("{prefix}.position"),
            value: to_int(cursor),
        });
    }

    let mut records = Vec::with_capacity(count);
    for i in 0..count {
        let key = format!("{prefix}.{i}");
        let start = read_count(store, &format!("{key}.start"))?;
        let before = read_string(store, &format!("{key}.before"))?;
        let after = read_string(store, &format!("{key}.after"))?;
        records.push(EditRecord::new(start, before, after));
    }
    Ok(Some(HistoryLog::from_parts(records, cursor, max_size)))
}

fn read_int(store: &dyn KeyValueStore, key: &str) -> Result<i64, RestoreError> {
    store
        .get_int(key)
        .ok_or_else(|| RestoreError::MissingField(key.to_string()))
}

fn read_count(store: &dyn KeyValueStore, key: &str) -> Result<usize, RestoreError> {
    let value = read_int(store, key)?;
    usize::try_from(value).map_err(|_| RestoreError::InvalidField {
        key: key.to_string(),
        value,
    })
}

fn read_string(store: &dyn KeyValueStore, key: &str) -> Result<String, RestoreError> {
    store
        .get_string(key)
        .ok_or_else(|| RestoreError::MissingField(key.to_string()))
}
