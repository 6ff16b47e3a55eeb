//! Dedup/result store abstraction.
//!
//! One flat string keyspace holds every processed log file: the key is the
//! file name, the value is either the rendered grade report or the text of
//! the error that rejected the file. Presence of a value is the only fact
//! discovery relies on.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreError;

/// Key-value store shared by every grader instance.
///
/// Implementations take `&self` so one store can be shared between the
/// discovery pass and the writer without exclusive borrows.
pub trait ResultStore {
    /// Look up the stored outcome for `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Persist the outcome for `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// `true` when any value, success payload or error text, is stored
    /// under `key`.
    fn is_processed(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: ResultStore + ?Sized> ResultStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

impl<T: ResultStore + ?Sized> ResultStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

/// Process-local store, used in tests and for dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `(key, value)` pairs.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
