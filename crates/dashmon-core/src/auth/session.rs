use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use super::store::{StoreError, TokenStore};

/// Token file name in cache directory
const TOKEN_FILE: &str = "tokens.json";

/// Stores tokens as a JSON object in the cache directory.
///
/// Every call goes to disk so separate processes see each other's writes.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self::at_path(cache_dir.join(TOKEN_FILE))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if values.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write a sibling file and rename it so readers never see a partial file
        let contents = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Load for a write. A corrupt file is discarded rather than blocking
    /// the write that would replace it.
    fn load_for_write(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match self.load() {
            Err(StoreError::Parse(e)) => {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt token file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut values = self.load_for_write()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        match self.load() {
            Ok(mut values) => {
                if values.remove(key).is_some() {
                    self.save(&values)?;
                }
                Ok(())
            }
            Err(StoreError::Parse(e)) => {
                warn!(path = %self.path.display(), error = %e, "Removing corrupt token file");
                self.save(&BTreeMap::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    fn temp_store(name: &str) -> FileStore {
        let dir = std::env::temp_dir()
            .join("dashmon-tests")
            .join(format!("{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        FileStore::new(&dir)
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let store = temp_store("persist");
        store.set(ACCESS_TOKEN_KEY, "access-1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "refresh-1").unwrap();

        let reopened = FileStore::at_path(store.path().to_path_buf());
        assert_eq!(reopened.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("access-1"));
        assert_eq!(reopened.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn test_file_store_removes_file_when_empty() {
        let store = temp_store("empty");
        store.set(ACCESS_TOKEN_KEY, "a").unwrap();
        assert!(store.path().exists());

        store.remove(ACCESS_TOKEN_KEY).unwrap();
        store.remove(REFRESH_TOKEN_KEY).unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let store = temp_store("corrupt");
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.get(ACCESS_TOKEN_KEY), Err(StoreError::Parse(_))));
    }

    #[test]
    fn test_file_store_remove_clears_corrupt_file() {
        let store = temp_store("corrupt-remove");
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"dm_access_token": "abc"#).unwrap();

        store.remove(ACCESS_TOKEN_KEY).unwrap();
        store.remove(REFRESH_TOKEN_KEY).unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_set_overwrites_corrupt_file() {
        let store = temp_store("corrupt-set");
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"dm_access_token": "abc"#).unwrap();

        store.set(ACCESS_TOKEN_KEY, "access-2").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("access-2"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);
        assert!(!store.path().with_extension("json.tmp").exists());
    }
}
