//! Session Storage - Persistence layer for session keys
//!
//! A flat string-to-string store. Reads never fail: anything missing or
//! unreadable is reported as absent. Writes surface storage errors.

use ficct_core::{storage_error, FicctError, FicctResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key-value backend holding the session keys
pub trait SessionStorage: Send + Sync {
    /// Read a value; `None` when absent or unreadable
    fn get(&self, key: &str) -> Option<String>;

    /// Write a single value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> FicctResult<()>;

    /// Remove a value; removing an absent key is not an error
    fn remove(&self, key: &str) -> FicctResult<()>;

    /// Write several values; backends that can do so apply them in one step
    fn set_many(&self, entries: &[(&str, String)]) -> FicctResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several values
    fn remove_many(&self, keys: &[&str]) -> FicctResult<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> FicctResult<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> FicctResult<()> {
        self.values.write().remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> FicctResult<()> {
        let mut values = self.values.write();
        for (key, value) in entries {
            values.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> FicctResult<()> {
        let mut values = self.values.write();
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

/// Storage backed by a single JSON object file
///
/// The file is re-read on every access so that another process writing the
/// same file (a second CLI invocation logging out, say) is observed.
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        debug!("Session storage at: {}", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> HashMap<String, String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!("Failed to read session file {}: {}", self.path.display(), e);
                return HashMap::new();
            }
        };

        if content.trim().is_empty() {
            return HashMap::new();
        }

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(
                "Ignoring corrupted session file {}: {}",
                self.path.display(),
                e
            );
            HashMap::new()
        })
    }

    fn write_all(&self, values: &HashMap<String, String>) -> FicctResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| storage_error!("Failed to create session directory", "file_storage", e))?;
        }

        let json_data = serde_json::to_string_pretty(values).map_err(FicctError::Serialization)?;

        // Write next to the target and rename so readers never see a torn file
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json_data)
            .map_err(|e| storage_error!("Failed to write session file", "file_storage", e))?;
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|e| storage_error!("Failed to replace session file", "file_storage", e))?;

        Ok(())
    }

    fn update<F>(&self, mutate: F) -> FicctResult<()>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self.write_lock.lock();
        let mut values = self.read_all();
        mutate(&mut values);
        self.write_all(&values)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> FicctResult<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> FicctResult<()> {
        self.remove_many(&[key])
    }

    fn set_many(&self, entries: &[(&str, String)]) -> FicctResult<()> {
        self.update(|values| {
            for (key, value) in entries {
                values.insert(key.to_string(), value.clone());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> FicctResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|values| {
            for key in keys {
                values.remove(*key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("token"), None);

        storage.set("token", "abc").unwrap();
        assert_eq!(storage.get("token").as_deref(), Some("abc"));

        storage.remove("token").unwrap();
        storage.remove("token").unwrap();
        assert_eq!(storage.get("token"), None);
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let first = FileStorage::new(&path);
        first
            .set_many(&[("token", "abc".to_string()), ("rol", "docente".to_string())])
            .unwrap();

        let second = FileStorage::new(&path);
        assert_eq!(second.get("token").as_deref(), Some("abc"));
        assert_eq!(second.get("rol").as_deref(), Some("docente"));

        second.remove_many(&["token", "rol"]).unwrap();
        assert_eq!(first.get("token"), None);
    }

    #[test]
    fn test_file_storage_remove_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("missing.json"));
        storage.remove("token").unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_corrupted_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let storage = FileStorage::new(&path);
        assert_eq!(storage.get("token"), None);

        storage.set("token", "fresh").unwrap();
        assert_eq!(storage.get("token").as_deref(), Some("fresh"));
    }
}
