//! Key-value storage channel (the browser local-storage analog).
//!
//! The channel serializes a snapshot under a fixed key in a [`StateStore`]
//! collaborator, overwriting whatever was there. Two stores are provided:
//! [`MemoryStore`] for tests and embedding hosts with their own
//! persistence, and [`FsStore`], one file per key under a directory
//! (defaulting to the platform config directory).

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use patchbay_core::Workspace;

use crate::error::StateError;
use crate::paths;
use crate::snapshot::WorkspaceSnapshot;

/// Fixed key the workspace state is saved under.
pub const STORAGE_KEY: &str = "patcherState";

/// Byte-sink/byte-source collaborator with key-value shape.
pub trait StateStore {
    /// Reads the value under `key`; `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, StateError>;

    /// Writes `value` under `key`, overwriting any prior value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError>;
}

/// In-memory store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store keeping one `<key>.json` file per key under a directory.
#[derive(Clone, Debug)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// A store rooted at the given directory. The directory is created on
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A store rooted at the platform state directory for patchbay.
    pub fn open_default() -> Self {
        Self::new(paths::user_state_dir())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for FsStore {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StateError::read_file(path, err)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)
                .map_err(|err| StateError::create_dir(&self.dir, err))?;
        }
        let path = self.path_for(key);
        std::fs::write(&path, value).map_err(|err| StateError::write_file(path, err))
    }
}

/// Persistence channel over a [`StateStore`].
#[derive(Clone, Debug)]
pub struct StorageChannel<S> {
    store: S,
    key: String,
}

impl<S: StateStore> StorageChannel<S> {
    /// A channel over `store` using the fixed [`STORAGE_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    /// A channel over `store` using a caller-chosen key.
    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Serializes and writes a snapshot, overwriting any prior value.
    pub fn write(&mut self, snapshot: &WorkspaceSnapshot) -> Result<(), StateError> {
        let json = snapshot.to_json()?;
        self.store.set(&self.key, &json)
    }

    /// Captures the workspace and writes the result.
    pub fn save(&mut self, workspace: &Workspace) -> Result<(), StateError> {
        self.write(&WorkspaceSnapshot::capture(workspace))
    }

    /// Reads and parses the stored snapshot.
    ///
    /// # Errors
    ///
    /// [`StateError::NoSavedState`] when nothing is stored; a decode error
    /// when the stored value does not parse.
    pub fn read(&self) -> Result<WorkspaceSnapshot, StateError> {
        match self.store.get(&self.key)? {
            Some(json) => WorkspaceSnapshot::from_json(&json),
            None => Err(StateError::NoSavedState),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DeviceRecord;

    fn sample() -> WorkspaceSnapshot {
        WorkspaceSnapshot(vec![DeviceRecord {
            id: "osc-0".to_string(),
            left: "1px".to_string(),
            top: "2px".to_string(),
            connections: vec![],
            inputs: std::collections::BTreeMap::new(),
        }])
    }

    #[test]
    fn empty_store_reports_no_saved_state() {
        let channel = StorageChannel::new(MemoryStore::new());
        assert!(matches!(channel.read(), Err(StateError::NoSavedState)));
    }

    #[test]
    fn write_then_read_roundtrips() {
        let mut channel = StorageChannel::new(MemoryStore::new());
        channel.write(&sample()).unwrap();
        assert_eq!(channel.read().unwrap(), sample());
    }

    #[test]
    fn write_overwrites_prior_value() {
        let mut channel = StorageChannel::new(MemoryStore::new());
        channel.write(&sample()).unwrap();
        channel.write(&WorkspaceSnapshot::default()).unwrap();
        assert!(channel.read().unwrap().is_empty());
    }

    #[test]
    fn corrupted_value_is_a_decode_error() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "{definitely not json").unwrap();
        let channel = StorageChannel::new(store);
        assert!(matches!(channel.read(), Err(StateError::Decode(_))));
    }

    #[test]
    fn fs_store_roundtrips_under_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut channel = StorageChannel::new(FsStore::new(dir.path().join("state")));
        assert!(matches!(channel.read(), Err(StateError::NoSavedState)));

        channel.write(&sample()).unwrap();
        assert_eq!(channel.read().unwrap(), sample());
        assert!(
            dir.path()
                .join("state")
                .join("patcherState.json")
                .is_file()
        );
    }
}
