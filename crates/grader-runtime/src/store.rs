//! File-backed result store.
//!
//! The store is a single flat JSON object (`{"log-…": "<outcome>"}`). It is
//! re-read on every lookup so that several grader processes pointed at the
//! same file observe each other's writes, and every write replaces the file
//! atomically via a temp file + rename.
//!
//! Writes are read-modify-write without a cross-process lock: two graders
//! writing at the same instant can lose one entry, which only causes that
//! file to be graded again on a later poll.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use grader_core::error::StoreError;
use grader_core::store::ResultStore;

/// JSON document on disk acting as the dedup/result store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (lazily) the store at `path`. The file and its parent
    /// directories are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document. A missing or blank file is an empty store.
    pub fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Backend {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let backend = |source| StoreError::Backend {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(backend)?;
        }

        let json = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        // Write to a temp file then rename for atomicity.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(backend)?;
        std::fs::rename(&tmp, &self.path).map_err(backend)?;
        Ok(())
    }
}

impl ResultStore for JsonFileStore {
    /// Reads and parses the whole document, so each lookup costs time
    /// proportional to the store's full history. Discovery stops at the
    /// first recorded file, which keeps the lookups per cycle to roughly
    /// the number of new files.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)?;
        tracing::debug!(key, store = %self.path.display(), "outcome recorded");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(tmp: &TempDir) -> JsonFileStore {
        JsonFileStore::new(tmp.path().join("state").join("results.json"))
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        assert_eq!(store.get("log-1").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_creates_parent_and_persists() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.set("log-1", "{}").unwrap();
        assert!(store.path().exists());

        let reopened = store_in(&tmp);
        assert_eq!(reopened.get("log-1").unwrap().as_deref(), Some("{}"));
        assert!(reopened.is_processed("log-1").unwrap());
    }

    #[test]
    fn test_two_handles_share_state() {
        let tmp = TempDir::new().unwrap();
        let a = store_in(&tmp);
        let b = store_in(&tmp);
        a.set("log-1", "x").unwrap();
        b.set("log-2", "y").unwrap();
        assert_eq!(a.get("log-2").unwrap().as_deref(), Some("y"));
        assert_eq!(b.get("log-1").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_get_sees_writes_made_behind_its_back() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.set("log-1", "{}").unwrap();
        assert_eq!(store.get("log-2").unwrap(), None);

        std::fs::write(store.path(), r#"{"log-1": "{}", "log-2": "{}"}"#).unwrap();
        assert_eq!(store.get("log-2").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_multiline_values_survive() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let report = "{\n  \"temp-1\": \"precise\"\n}";
        store.set("log-1", report).unwrap();
        assert_eq!(store.get("log-1").unwrap().as_deref(), Some(report));
    }

    #[test]
    fn test_blank_file_is_empty_store() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.json");
        std::fs::write(&path, "  \n").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get("log-1"),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.set("log-1", "{}").unwrap();
        assert!(!store.path().with_extension("json.tmp").exists());
    }
}
