//! Persisted identity for the current portal user.
//!
//! DESIGN
//! ======
//! The identity is a single username string kept under a fixed key in a
//! durable key-value store, the way a browser page keeps it in local storage.
//! Page controllers never touch the store directly: each receives a
//! [`Session`] at construction and goes through `current`/`persist`/`clear`.
//!
//! Reads are forgiving. A store that cannot be read counts as "logged out",
//! which sends the user back to the login page instead of failing the page.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::StorageError;

/// Storage key holding the logged-in username.
pub const IDENTITY_KEY: &str = "currentUser";

// =============================================================================
// STORE
// =============================================================================

/// Durable string key-value store scoped to one portal origin.
pub trait IdentityStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object file. A missing file reads as empty.
///
/// Writes land in a sibling temp file that is renamed over the original.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(items)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut items = self.load()?;
        mutate(&mut items);
        self.save(&items)
    }
}

impl IdentityStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.remove(key);
        })
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Read/write/clear handle over the persisted identity.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn IdentityStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The logged-in username, if any. Empty values and unreadable stores
    /// both count as absent.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        match self.store.get_item(IDENTITY_KEY) {
            Ok(value) => value.filter(|username| !username.is_empty()),
            Err(e) => {
                warn!(error = %e, "identity store unreadable; treating as logged out");
                None
            }
        }
    }

    /// Record `username` as the logged-in identity.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write fails.
    pub fn persist(&self, username: &str) -> Result<(), StorageError> {
        self.store.set_item(IDENTITY_KEY, username)?;
        debug!(%username, "identity persisted");
        Ok(())
    }

    /// Forget the logged-in identity. Clearing an absent identity is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the removal fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove_item(IDENTITY_KEY)?;
        debug!("identity cleared");
        Ok(())
    }
}
