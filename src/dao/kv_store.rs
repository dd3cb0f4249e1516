//! Device-local durable key-value store (the only persisted state of the client).

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::RwLock,
};

use dashmap::DashMap;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info};

/// Result alias for key-value store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by local store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("failed to access store file `{path}`")]
    Io {
        /// Backing file.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The backing file exists but is not a JSON object of strings.
    #[error("store file `{path}` is corrupted")]
    Corrupted {
        /// Backing file.
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A writer panicked while holding the in-memory map.
    #[error("store lock poisoned")]
    Poisoned,
}

/// String-to-string persistent storage.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<IndexMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<IndexMap<String, String>>(&contents)
                .map_err(|source| StoreError::Corrupted {
                    path: path.clone(),
                    source,
                })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "store file not found; starting empty");
                IndexMap::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        debug!(path = %path.display(), count = entries.len(), "opened local store");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &IndexMap<String, String>) -> StoreResult<()> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(entries).map_err(|source| {
            StoreError::Corrupted {
                path: self.path.clone(),
                source,
            }
        })?;

        // Write next to the target and rename so a crash never leaves half a file.
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, contents).map_err(io_err)?;
        fs::rename(&staging, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let guard = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut guard = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        // Memory only changes once the file holds the new entry.
        let mut staged = guard.clone();
        staged.insert(key.to_string(), value.to_string());
        self.flush(&staged)?;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("binge-brain-{}", Uuid::new_v4().simple()))
            .join("store.json")
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("name").unwrap(), None);
        store.set("name", "Joey").unwrap();
        assert_eq!(store.get("name").unwrap().as_deref(), Some("Joey"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = scratch_path();
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("unlockedLevels", "3").unwrap();
            store.set("name", "Rachel").unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("unlockedLevels").unwrap().as_deref(), Some("3"));
        assert_eq!(reopened.get("name").unwrap().as_deref(), Some("Rachel"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn failed_write_leaves_previous_value() {
        let path = scratch_path();
        let store = JsonFileStore::open(&path).unwrap();
        store.set("unlockedLevels", "4").unwrap();

        // A directory in the staging spot makes the next write fail.
        fs::create_dir_all(path.with_extension("tmp")).unwrap();
        let err = store.set("unlockedLevels", "5").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(store.set("name", "Phoebe").is_err());

        assert_eq!(store.get("unlockedLevels").unwrap().as_deref(), Some("4"));
        assert_eq!(store.get("name").unwrap(), None);
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("unlockedLevels").unwrap().as_deref(), Some("4"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupted_file_is_reported() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { .. }));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
