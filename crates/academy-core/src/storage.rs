//! Key-value storage adapter for engine records.
//!
//! Mirrors the browser local-storage surface the site runs against: opaque
//! string keys, JSON blobs, last-write-wins. Keys are namespaced
//! `<user_id>/<record-kind>` and must stay stable within one deployment.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::AcademyError;

/// Record-kind suffixes for per-user storage keys.
pub const XP_EVENTS_KEY: &str = "xp_events";
pub const PROGRESS_KEY: &str = "progress";
pub const TUTORIALS_KEY: &str = "tutorials";
pub const ACHIEVEMENTS_KEY: &str = "achievements";

/// All record kinds, in purge order.
pub const RECORD_KINDS: [&str; 4] = [
    XP_EVENTS_KEY,
    PROGRESS_KEY,
    TUTORIALS_KEY,
    ACHIEVEMENTS_KEY,
];

/// Build the storage key for one user's records of one kind.
pub fn user_key(user_id: &str, kind: &str) -> String {
    format!("{}/{}", user_id, kind)
}

/// Persistence surface consumed by the engine services.
///
/// No transactions; each operation touches exactly one key. Implementations
/// either succeed or fail permanently (quota, serialization) and the failure
/// is surfaced to the caller, never retried here.
pub trait StorageAdapter: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, AcademyError>;
    fn set(&self, key: &str, value: &Value) -> Result<(), AcademyError>;
    fn remove(&self, key: &str) -> Result<(), AcademyError>;
}

/// Load and decode a typed record list from one key.
///
/// A missing key is an empty list; a blob that does not decode is a
/// `MalformedRecord`, never a silent default.
pub fn load_records<T: DeserializeOwned>(
    store: &dyn StorageAdapter,
    key: &str,
) -> Result<Vec<T>, AcademyError> {
    match store.get(key)? {
        None => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value).map_err(|e| AcademyError::MalformedRecord {
                key: key.to_string(),
                detail: e.to_string(),
            })
        }
    }
}

/// Encode and write a typed record list to one key.
pub fn save_records<T: Serialize>(
    store: &dyn StorageAdapter,
    key: &str,
    records: &[T],
) -> Result<(), AcademyError> {
    let value = serde_json::to_value(records)?;
    store.set(key, &value)
}

/// In-memory store. Stands in for browser local storage in tests and
/// ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, AcademyError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AcademyError::Storage("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), AcademyError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AcademyError::Storage("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AcademyError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AcademyError::Storage("memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one pretty-printed JSON file per key under a root
/// directory. Keys containing '/' become subdirectories.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in key.split('/') {
            path.push(part);
        }
        path.set_extension("json");
        path
    }
}

impl StorageAdapter for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, AcademyError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let value =
            serde_json::from_str(&content).map_err(|e| AcademyError::MalformedRecord {
                key: key.to_string(),
                detail: e.to_string(),
            })?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), AcademyError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AcademyError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
