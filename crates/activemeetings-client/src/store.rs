//! JSON-file membership store.
//!
//! The file holds one flat JSON object of string values, keyed like the
//! browser storage it stands in for:
//!
//! ```json
//! { "joinedRooms-u1": "Room A,Room B", "lastJoinedName": "Ada" }
//! ```
//!
//! Reads check the file's modification time and size, so a `remember`
//! issued from another terminal is visible to a running `watch` on the next
//! event. The file is only parsed again when that stamp changes; a
//! same-size rewrite within the filesystem's timestamp resolution is missed
//! until the next change.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use activemeetings_core::{joined_rooms_key, MembershipStore, LAST_JOINED_NAME_KEY};
use tracing::{debug, trace, warn};

use crate::error::{ClientError, ClientResult};

/// Identifies one version of the store file. `None` when it does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

#[derive(Debug)]
struct Cached {
    stamp: Option<FileStamp>,
    values: BTreeMap<String, String>,
}

/// Membership store backed by a JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Option<Cached>>,
}

impl FileStore {
    /// Creates a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Returns the store path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored value. A missing file is an empty store.
    pub fn load(&self) -> ClientResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| ClientError::Store(format!("failed to read {}: {}", self.path.display(), e)))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| ClientError::Store(format!("failed to parse {}: {}", self.path.display(), e)))
    }

    /// Sets `key` to `value` and writes the file.
    pub fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    /// Adds `meeting` to `user`'s previously joined meetings.
    ///
    /// Returns false if it was already there.
    pub fn remember_meeting(&self, user: &str, meeting: &str) -> ClientResult<bool> {
        let mut joined = self.previously_joined(user);
        if !joined.insert(meeting) {
            return Ok(false);
        }
        self.set(&joined_rooms_key(user), &joined.to_stored())?;
        Ok(true)
    }

    /// Stores the display name used when joining.
    pub fn set_display_name(&self, name: &str) -> ClientResult<()> {
        if name.trim().is_empty() {
            return Err(ClientError::Store("display name must not be blank".into()));
        }
        self.set(LAST_JOINED_NAME_KEY, name)
    }

    fn stamp(&self) -> io::Result<Option<FileStamp>> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(FileStamp {
                modified: meta.modified().ok(),
                len: meta.len(),
            })),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn cache(&self) -> MutexGuard<'_, Option<Cached>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Looks `key` up, parsing the file only if it changed since the last
    /// read.
    fn cached_get(&self, key: &str) -> ClientResult<Option<String>> {
        let stamp = self
            .stamp()
            .map_err(|e| ClientError::Store(format!("failed to stat {}: {}", self.path.display(), e)))?;

        let mut cache = self.cache();
        if let Some(cached) = cache.as_ref().filter(|cached| cached.stamp == stamp) {
            return Ok(cached.values.get(key).cloned());
        }

        let values = self.load()?;
        trace!(path = %self.path.display(), keys = values.len(), "Reloaded membership store");
        let value = values.get(key).cloned();
        *cache = Some(Cached { stamp, values });
        Ok(value)
    }

    fn save(&self, values: &BTreeMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Store(format!("failed to create store directory: {}", e))
            })?;
        }

        // Write to temp file first, then rename
        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(values)
            .map_err(|e| ClientError::Store(format!("failed to serialize store: {}", e)))?;
        fs::write(&temp_path, content)
            .map_err(|e| ClientError::Store(format!("failed to write store: {}", e)))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| ClientError::Store(format!("failed to rename store file: {}", e)))?;

        let stamp = self.stamp().ok().flatten();
        *self.cache() = stamp.map(|stamp| Cached {
            stamp: Some(stamp),
            values: values.clone(),
        });

        debug!(path = %self.path.display(), keys = values.len(), "Saved membership store");
        Ok(())
    }
}

impl MembershipStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.cached_get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "Membership store unreadable, treating as empty");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("store.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_is_empty() {
        let (_dir, store) = store();
        assert!(store.load().unwrap().is_empty());
        assert!(store.previously_joined("u1").is_empty());
        assert!(store.display_name().is_none());
    }

    #[test]
    fn remember_meetings_and_name() {
        let (_dir, store) = store();
        assert!(store.remember_meeting("u1", "Room A").unwrap());
        assert!(store.remember_meeting("u1", "Room B").unwrap());
        assert!(!store.remember_meeting("u1", "Room A").unwrap());
        store.set_display_name("Ada").unwrap();

        assert_eq!(
            store.get("joinedRooms-u1").as_deref(),
            Some("Room A,Room B")
        );
        assert_eq!(store.display_name().as_deref(), Some("Ada"));
        assert!(store.previously_joined("u2").is_empty());
    }

    #[test]
    fn reads_are_fresh() {
        let (_dir, store) = store();
        let other = FileStore::new(store.path());

        assert!(!store.previously_joined("u1").contains("Room A"));
        other.remember_meeting("u1", "Room A").unwrap();
        assert!(store.previously_joined("u1").contains("Room A"));
    }

    #[test]
    fn unchanged_file_is_not_parsed_again() {
        let (_dir, store) = store();
        store.set_display_name("Ada").unwrap();
        let reader = FileStore::new(store.path());
        assert_eq!(reader.display_name().as_deref(), Some("Ada"));

        // Same size and modification time: the cached values are served
        let meta = fs::metadata(store.path()).unwrap();
        let modified = meta.modified().unwrap();
        fs::write(store.path(), "x".repeat(meta.len() as usize)).unwrap();
        fs::File::options()
            .write(true)
            .open(store.path())
            .unwrap()
            .set_modified(modified)
            .unwrap();
        assert_eq!(reader.display_name().as_deref(), Some("Ada"));

        // Any other rewrite is picked up
        fs::write(store.path(), r#"{"lastJoinedName":"Grace"}"#).unwrap();
        assert_eq!(reader.display_name().as_deref(), Some("Grace"));
    }

    #[test]
    fn deleted_file_reads_as_empty() {
        let (_dir, store) = store();
        store.remember_meeting("u1", "Room A").unwrap();
        assert!(store.previously_joined("u1").contains("Room A"));

        fs::remove_file(store.path()).unwrap();
        assert!(store.previously_joined("u1").is_empty());
    }

    #[test]
    fn blank_display_name_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.set_display_name("  "),
            Err(ClientError::Store(_))
        ));
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.load(), Err(ClientError::Store(_))));
        assert!(store.get(LAST_JOINED_NAME_KEY).is_none());
    }
}
