//! Extension-scoped key-value storage.
//!
//! Values are JSON, mirroring the browser's `storage.local` area. The
//! syncer only ever talks to the [`KeyValueStore`] port, so tests use
//! [`MemoryStore`] while the binary persists to a [`FileStore`].

use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write all `items` at once.
    fn set(&self, items: Vec<(&str, Value)>) -> Result<()>;

    /// Remove `keys`; missing keys are not an error.
    fn remove(&self, keys: &[&str]) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, items: Vec<(&str, Value)>) -> Result<()> {
        (**self).set(items)
    }

    fn remove(&self, keys: &[&str]) -> Result<()> {
        (**self).remove(keys)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_items<T>(&self, f: impl FnOnce(&mut Map<String, Value>) -> T) -> Result<T> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".into()))?;
        Ok(f(&mut items))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.with_items(|items| items.get(key).cloned())
    }

    fn set(&self, new_items: Vec<(&str, Value)>) -> Result<()> {
        self.with_items(|items| {
            for (key, value) in new_items {
                items.insert(key.to_string(), value);
            }
        })
    }

    fn remove(&self, keys: &[&str]) -> Result<()> {
        self.with_items(|items| {
            for key in keys {
                items.remove(*key);
            }
        })
    }
}

/// A JSON object kept in a single file. Every operation reads the file, so
/// several processes sharing one store see each other's writes.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/neethub/storage.json`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Storage("no configuration directory on this platform".into()))?;
        Ok(dir.join("neethub").join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(items) => Ok(items),
            _ => Err(Error::Storage(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn save(&self, items: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut file = open_private(&tmp)?;
        file.write_all(serde_json::to_string_pretty(items)?.as_bytes())?;
        file.sync_all()?;
        drop(file);

        // The store holds the access token: owner-only on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn open_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, new_items: Vec<(&str, Value)>) -> Result<()> {
        let mut items = self.load()?;
        for (key, value) in new_items {
            items.insert(key.to_string(), value);
        }
        self.save(&items)
    }

    fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut items = self.load()?;
        let before = items.len();
        for key in keys {
            items.remove(*key);
        }
        if items.len() != before {
            self.save(&items)?;
        }
        Ok(())
    }
}
