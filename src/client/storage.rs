//! Durable key-value storage for the persisted session.
//!
//! The portal keeps two records across reloads:
//! - `"user"`: the JSON-serialized [`User`] of the current session
//! - `"locale"`: the preferred locale code
//!
//! ## Backends
//!
//! - [`BrowserStorage`]: `window.localStorage` (wasm32 only)
//! - [`FileStorage`]: a JSON object on disk, for native clients
//! - [`MemoryStorage`]: process-local map, cleared when the process exits
//!
//! ## Storage Strategy
//!
//! - On startup: read `"user"` once to restore the session
//! - On login: write `"user"` after the in-memory session is set
//! - On logout or 401: remove `"user"`

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::User;
use crate::error::StorageError;

/// Storage key for the persisted user record
pub const USER_STORAGE_KEY: &str = "user";

/// Storage key for the locale preference
pub const LOCALE_STORAGE_KEY: &str = "locale";

/// Durable string key-value storage.
///
/// Reads are infallible: a backend that cannot be read behaves as empty.
pub trait Storage: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Reads the persisted user record.
///
/// A missing record yields `None`. A malformed record is logged and also
/// yields `None`; it is treated as no session rather than an error.
pub fn load_user(storage: &dyn Storage) -> Option<User> {
    let record = storage.get(USER_STORAGE_KEY)?;

    match User::from_record(&record) {
        Ok(user) => {
            tracing::trace!("Restored persisted user record for {}", user.username);
            Some(user)
        }
        Err(e) => {
            tracing::warn!("Persisted user record is malformed, ignoring: {}", e);
            None
        }
    }
}

/// Writes the persisted user record.
pub fn store_user(storage: &dyn Storage, user: &User) -> Result<(), StorageError> {
    let record = user.to_record()?;
    storage.set(USER_STORAGE_KEY, &record)?;
    tracing::trace!("Persisted user record for {}", user.username);
    Ok(())
}

/// Removes the persisted user record.
///
/// Failures are logged; callers treat clearing as best effort.
pub fn clear_user(storage: &dyn Storage) {
    match storage.remove(USER_STORAGE_KEY) {
        Ok(()) => tracing::trace!("Persisted user record cleared"),
        Err(e) => tracing::warn!("Failed to clear persisted user record: {}", e),
    }
}

/// Process-local storage.
///
/// Cheap to clone; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(map)),
        }
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Storage persisted as a single JSON object file.
///
/// The whole map is rewritten on every mutation, into a sibling `.tmp` file
/// that is then renamed over the original, so a crash mid-write leaves the
/// previous contents intact. An unreadable or malformed file is treated as
/// empty and replaced on the next write.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens (or lazily creates) the storage file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        "Storage file {} is malformed, starting empty: {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::trace!("Storage file {} not found, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Storage file {} could not be read, starting empty: {}",
                    path.display(),
                    e
                );
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        let temp = self.temp_path();
        std::fs::write(&temp, contents)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("storage"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// Browser `localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

#[cfg(target_arch = "wasm32")]
impl BrowserStorage {
    fn local_storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::local_storage().ok()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::local_storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Self::local_storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }
}
