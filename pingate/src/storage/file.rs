//! File-backed key/value store.
//!
//! The whole namespace is kept as one JSON object on disk. Every write
//! replaces the file atomically (write to a temp file, then rename) and, on
//! Unix, restricts it to the owner.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use super::kv::KeyValueStore;
use crate::error::{PinGateError, Result};

/// Store file name inside the data directory.
pub const STORE_FILE_NAME: &str = "secure_prefs.json";

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store in `data_dir`, creating the directory if needed.
    ///
    /// A missing file is an empty store; it is created on the first write.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(STORE_FILE_NAME);

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                PinGateError::Storage(format!("Store file {:?} is corrupted: {}", path, e))
            })?
        } else {
            BTreeMap::new()
        };

        debug!("Opened file store at {:?}", path);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| PinGateError::Storage("File store lock poisoned".into()))
    }

    /// Apply `update` to a copy of the map, persist it, then commit in memory.
    fn mutate<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.lock()?;
        let mut next = entries.clone();
        update(&mut next);
        write_atomically(&self.path, &next)?;
        *entries = next;
        Ok(())
    }
}

fn write_atomically(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
    let content = serde_json::to_vec_pretty(entries)?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, &content)?;
    std::fs::rename(&temp_path, path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }

    Ok(())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.contains(key)? {
            return Ok(());
        }
        self.mutate(|map| {
            map.remove(key);
        })
    }

    /// Delete the store file, then drop the cached entries.
    ///
    /// If the file cannot be removed the cache is left as it was, so memory
    /// never claims a wipe the disk did not see.
    fn clear(&self) -> Result<()> {
        let mut entries = self.lock()?;

        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        let temp_path = self.path.with_extension("json.tmp");
        if temp_path.exists() {
            std::fs::remove_file(&temp_path)?;
        }

        entries.clear();
        info!("Cleared file store at {:?}", self.path);
        Ok(())
    }

    fn put_batch(&self, batch: &[(&str, String)]) -> Result<()> {
        self.mutate(|map| {
            for (key, value) in batch {
                map.insert(key.to_string(), value.clone());
            }
        })
    }
}
