//! `localStorage` backend

use web_sys::Storage;

use ld_core::{LdError, LdResult};
use ld_state::KeyValueStore;

/// Key-value store over the page's `localStorage`
pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub fn open() -> LdResult<Self> {
        let window = web_sys::window().ok_or_else(|| LdError::Storage("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|e| LdError::Storage(format!("localStorage denied: {:?}", e)))?
            .ok_or_else(|| LdError::Storage("localStorage unavailable".into()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> LdResult<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| LdError::Storage(format!("read {key}: {:?}", e)))
    }

    fn set(&self, key: &str, value: &str) -> LdResult<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| LdError::Storage(format!("write {key}: {:?}", e)))
    }

    fn remove(&self, key: &str) -> LdResult<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| LdError::Storage(format!("remove {key}: {:?}", e)))
    }
}
