//! Loading and persisting the configuration.
//!
//! The configuration lives as one JSON blob under [`STORAGE_KEY`] in a
//! key/value [`Storage`]. Every failure on this path is recoverable: a
//! missing or corrupt blob loads as the defaults, and a failed write leaves
//! the in-memory configuration authoritative for the rest of the session.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::{ConfigPatch, Configuration};

/// Well-known key the configuration blob is stored under.
pub const STORAGE_KEY: &str = "pulsewatch_config_v1";

/// Errors from reading or writing persisted configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage I/O failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The configuration could not be serialized.
    #[error("failed to encode configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The storage backend refuses writes.
    #[error("storage is read-only")]
    ReadOnly,
}

/// A string key/value store for persisted blobs.
pub trait Storage: Send + Debug {
    /// Read the value under `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Storage backed by one `<key>.json` file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Write then rename so readers never see a half-written blob.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory storage, mostly for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut storage = Self::new();
        storage.entries.insert(key.to_string(), value.to_string());
        storage
    }

    /// Storage whose writes always fail.
    pub fn read_only() -> Self {
        Self {
            entries: HashMap::new(),
            read_only: true,
        }
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Loads, patches, persists and resets the configuration.
#[derive(Debug)]
pub struct ConfigStore {
    storage: Box<dyn Storage>,
    defaults: Configuration,
}

impl ConfigStore {
    /// Create a store over `storage` with the built-in defaults.
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self::with_defaults(storage, Configuration::default())
    }

    pub fn with_defaults(storage: Box<dyn Storage>, defaults: Configuration) -> Self {
        Self { storage, defaults }
    }

    pub fn defaults(&self) -> &Configuration {
        &self.defaults
    }

    /// Load the persisted configuration merged over the defaults.
    ///
    /// Absent, unreadable or malformed blobs yield the defaults unchanged.
    pub fn load(&self) -> Configuration {
        let raw = match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.defaults.clone(),
            Err(e) => {
                warn!("Could not read persisted configuration, using defaults: {}", e);
                return self.defaults.clone();
            }
        };

        let merged = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|persisted| Configuration::from_override(&self.defaults, persisted));

        match merged {
            Some(config) => config,
            None => {
                debug!("Persisted configuration is malformed, using defaults");
                self.defaults.clone()
            }
        }
    }

    /// Merge `partial` into `current` and persist the result.
    ///
    /// The merged configuration is returned even when persisting fails.
    pub fn patch(&mut self, current: &Configuration, partial: &ConfigPatch) -> Configuration {
        let next = current.patched(partial);
        if let Err(e) = self.persist(&next) {
            // In-memory configuration stays authoritative for this session.
            warn!("Failed to persist configuration: {}", e);
        }
        next
    }

    /// Serialize and store the full configuration.
    pub fn persist(&mut self, config: &Configuration) -> Result<(), StoreError> {
        let json = serde_json::to_string(config)?;
        self.storage.set(STORAGE_KEY, &json)
    }

    /// Clear persisted state. Reload afterwards to get the defaults back.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.storage.remove(STORAGE_KEY)
    }
}
