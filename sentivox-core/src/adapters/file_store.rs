//! File-backed key/value store
//!
//! All keys live in one JSON object (`storage.json`) in the app directory.
//! Every operation holds an exclusive lock on `storage.lock` so concurrent
//! CLI invocations never interleave writes, and writes replace the file
//! atomically through a temp file in the same directory.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::domain::result::{Error, Result};
use crate::ports::KeyValueStore;

const STORAGE_FILE: &str = "storage.json";
const LOCK_FILE: &str = "storage.lock";

type Entries = BTreeMap<String, String>;

/// Persistent [`KeyValueStore`] surviving process restarts
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store in `dir`, creating the directory if needed
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE)
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.dir.join(LOCK_FILE))?;
        FileExt::lock_exclusive(&lock)
            .map_err(|e| Error::storage(format!("Failed to lock store: {}", e)))?;

        let result = f();

        // Dropping the file releases the lock as well
        let _ = FileExt::unlock(&lock);
        result
    }

    /// Read all entries; a missing or corrupt file reads as empty
    fn load(&self) -> Entries {
        fs::read_to_string(self.path())
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn save(&self, entries: &Entries) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        let content = serde_json::to_string_pretty(entries)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path())
            .map_err(|e| Error::storage(format!("Failed to replace store file: {}", e)))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_lock(|| Ok(self.load().remove(key)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_lock(|| {
            let mut entries = self.load();
            entries.insert(key.to_string(), value.to_string());
            self.save(&entries)
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_lock(|| {
            let mut entries = self.load();
            if entries.remove(key).is_some() {
                self.save(&entries)?;
            }
            Ok(())
        })
    }
}
