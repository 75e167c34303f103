//! Named persistent values
//!
//! Features:
//! - `KeyValueStore` trait (int and string values with caller defaults)
//! - `MemoryStore` for tests and single-session hosts
//! - `JsonFileStore`: versioned JSON envelope, written via tmp file + rename

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Envelope format version
pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read/write store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store {path} has unsupported version {version}")]
    Version { path: PathBuf, version: u32 },
}

/// A stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Int(i64),
    Text(String),
}

/// Persistent key-value pairs shared between scenes
pub trait KeyValueStore {
    fn get_int(&self, key: &str, default: i64) -> i64;
    fn set_int(&mut self, key: &str, value: i64);
    fn get_string(&self, key: &str, default: &str) -> String;
    fn set_string(&mut self, key: &str, value: &str);
}

/// In-memory store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    values: BTreeMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(StoredValue::Int(v)) => *v,
            Some(StoredValue::Text(_)) => {
                log::warn!("Key '{}' holds text, expected int", key);
                default
            }
            None => default,
        }
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), StoredValue::Int(value));
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            Some(StoredValue::Text(v)) => v.clone(),
            Some(StoredValue::Int(_)) => {
                log::warn!("Key '{}' holds an int, expected text", key);
                default.to_string()
            }
            None => default.to_string(),
        }
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), StoredValue::Text(value.to_string()));
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    values: MemoryStore,
}

/// File-backed store. Every write is flushed to disk; write failures are
/// logged and the in-memory value is kept.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl JsonFileStore {
    /// Open a store, starting empty if the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let memory = match fs::read_to_string(&path) {
            Ok(text) => {
                let envelope: Envelope =
                    serde_json::from_str(&text).map_err(|source| StoreError::Json {
                        path: path.clone(),
                        source,
                    })?;
                if envelope.version != STORE_VERSION {
                    return Err(StoreError::Version {
                        path,
                        version: envelope.version,
                    });
                }
                log::info!("Loaded {} stored values from {}", envelope.values.len(), path.display());
                envelope.values
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No store at {}, starting fresh", path.display());
                MemoryStore::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, memory })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the envelope to `<path>.tmp`, then rename over `path`
    pub fn flush(&self) -> Result<(), StoreError> {
        let envelope = Envelope {
            version: STORE_VERSION,
            values: self.memory.clone(),
        };
        let json = serde_json::to_string_pretty(&envelope).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn flush_logged(&self) {
        if let Err(e) = self.flush() {
            log::error!("{}", e);
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.memory.get_int(key, default)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.memory.set_int(key, value);
        self.flush_logged();
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.memory.get_string(key, default)
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.memory.set_string(key, value);
        self.flush_logged();
    }
}
