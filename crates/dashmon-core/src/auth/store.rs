use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

/// Storage key for the short-lived access token.
pub const ACCESS_TOKEN_KEY: &str = "dm_access_token";

/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "dm_refresh_token";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("keychain error: {0}")]
    Keyring(String),

    #[error("token file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("token file is corrupt: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("token store lock poisoned")]
    Poisoned,
}

/// Persistent string key-value storage for credentials.
///
/// A missing key reads as `None`, and removing a missing key succeeds.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);

        store.set(ACCESS_TOKEN_KEY, "abc").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("abc"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);

        store.remove(ACCESS_TOKEN_KEY).unwrap();
        store.remove(ACCESS_TOKEN_KEY).unwrap(); // removing twice is fine
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }
}
