use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::StorageError;

/// Key under which the captured selection is stored.
pub const SELECTED_JSON_KEY: &str = "selectedJson";

const CHANGE_CAPACITY: usize = 16;

/// Notification that `key` was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub key: String,
}

/// Persistent string key-value storage with change notifications.
pub trait SelectionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

struct ChangeFeed {
    tx: broadcast::Sender<StoreChange>,
}

impl ChangeFeed {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CAPACITY);
        Self { tx }
    }

    fn notify(&self, key: &str) {
        // no receivers is fine
        let _ = self.tx.send(StoreChange { key: key.to_string() });
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }
}

pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    feed: ChangeFeed,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            feed: ChangeFeed::new(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.write().insert(key.to_string(), value.to_string());
        self.feed.notify(key);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }
}

/// A JSON object of string values in a single file.
///
/// Writes from this process notify subscribers immediately; writes from other
/// processes are picked up by [`FileStore::poll_external_change`].
pub struct FileStore {
    path: PathBuf,
    feed: ChangeFeed,
    seen: Mutex<Snapshot>,
}

#[derive(Default)]
struct Snapshot {
    modified: Option<SystemTime>,
    values: HashMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = read_values(&path)?;
        let modified = modified_time(&path);
        debug!(path = %path.display(), keys = values.len(), "opened file store");
        Ok(Self {
            path,
            feed: ChangeFeed::new(),
            seen: Mutex::new(Snapshot { modified, values }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reloads the file if its modification time moved and notifies
    /// subscribers of every key whose value changed. Returns whether any did.
    pub fn poll_external_change(&self) -> Result<bool, StorageError> {
        let modified = modified_time(&self.path);
        let mut seen = self.seen.lock();
        if modified == seen.modified {
            return Ok(false);
        }
        let values = read_values(&self.path)?;
        let mut changed: Vec<&String> = values
            .iter()
            .filter(|(k, v)| seen.values.get(*k) != Some(*v))
            .map(|(k, _)| k)
            .collect();
        changed.extend(seen.values.keys().filter(|k| !values.contains_key(*k)));
        for key in &changed {
            info!(key = %key, "store changed on disk");
            self.feed.notify(key);
        }
        let any = !changed.is_empty();
        *seen = Snapshot { modified, values };
        Ok(any)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn read_values(path: &Path) -> Result<HashMap<String, String>, StorageError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(&content).map_err(|source| StorageError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

impl SelectionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(read_values(&self.path)?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut seen = self.seen.lock();
        let mut values = read_values(&self.path)?;
        values.insert(key.to_string(), value.to_string());

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
        }
        let serialized = serde_json::to_string_pretty(&values).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serialized).map_err(|e| StorageError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StorageError::io(&self.path, e))?;

        *seen = Snapshot { modified: modified_time(&self.path), values };
        drop(seen);
        self.feed.notify(key);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }
}
