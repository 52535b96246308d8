//! Key-value storage backends
//!
//! Every persisted item is a JSON string under a fixed key, mirroring how a
//! browser `localStorage` is used. Backends take `&self` so one store can be
//! shared by the history and session stores.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use parking_lot::RwLock;

use ld_core::{LdError, LdResult};

/// Minimal string key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> LdResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> LdResult<()>;
    fn remove(&self, key: &str) -> LdResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get(&self, key: &str) -> LdResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> LdResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> LdResult<()> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> LdResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> LdResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> LdResult<()> {
        (**self).remove(key)
    }
}

// ============ Memory Store ============

/// Volatile store, used by tests and headless runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> LdResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> LdResult<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> LdResult<()> {
        self.items.write().remove(key);
        Ok(())
    }
}

// ============ File Store ============

/// One `<key>.json` file per item under a directory
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    /// Serializes writers within this process
    lock: RwLock<()>,
}

impl FileStore {
    /// Open (and create) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> LdResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        log::debug!("File store at {}", dir.display());
        Ok(Self {
            dir,
            lock: RwLock::new(()),
        })
    }

    /// `<local data dir>/LuckyDraw`
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("LuckyDraw")
    }

    pub fn open_default() -> LdResult<Self> {
        Self::open(Self::default_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> LdResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(LdError::Storage(format!("invalid storage key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> LdResult<Option<String>> {
        let path = self.path_for(key)?;
        let _guard = self.lock.read();
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> LdResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let _guard = self.lock.write();
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> LdResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.lock.write();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
