//! In-memory key/value store for cross-view UI state.
//!
//! Views use the store for small string hints that must survive navigation
//! (a pending search term, the selected tab), and the auth layer keeps the
//! session token here. Nothing is persisted to disk.
//!
//! ```
//! use plexus_core::LocalStore;
//!
//! let store = LocalStore::new();
//! store.set("pendingSearch", "rust meetups");
//! assert_eq!(store.get("pendingSearch").as_deref(), Some("rust meetups"));
//!
//! // Take-once semantics for one-shot hints.
//! assert!(store.take("pendingSearch").is_some());
//! assert!(store.get("pendingSearch").is_none());
//! ```

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{CoreError, Result};
use crate::logging::targets;
use crate::signal::Signal;

/// A cheaply clonable handle to a shared string key/value map.
///
/// All clones observe the same entries and share one `changed` signal.
#[derive(Clone, Default)]
pub struct LocalStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    entries: RwLock<HashMap<String, String>>,
    changed: Signal<String>,
}

impl LocalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.entries.read().get(key).cloned()
    }

    /// Get the value under `key` parsed as `T`.
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|e: T::Err| CoreError::Parse {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Store `value` under `key`, emitting `changed` if the value differs.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let changed = {
            let mut entries = self.inner.entries.write();
            entries.insert(key.clone(), value.clone()).as_deref() != Some(value.as_str())
        };
        if changed {
            tracing::debug!(target: targets::STORE, key = %key, "store entry set");
            self.inner.changed.emit(key);
        }
    }

    /// Remove `key`, returning its previous value.
    pub fn remove(&self, key: &str) -> Option<String> {
        let removed = self.inner.entries.write().remove(key);
        if removed.is_some() {
            tracing::debug!(target: targets::STORE, key = %key, "store entry removed");
            self.inner.changed.emit(key.to_string());
        }
        removed
    }

    /// Remove and return the value under `key`.
    ///
    /// Same as [`remove`](Self::remove); named for one-shot hints.
    pub fn take(&self, key: &str) -> Option<String> {
        self.remove(key)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.entries.read().contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    /// Signal emitted with the key of every entry that is set or removed.
    pub fn changed(&self) -> &Signal<String> {
        &self.inner.changed
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("len", &self.len())
            .finish()
    }
}
