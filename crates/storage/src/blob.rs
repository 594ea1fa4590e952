//! Flat key-value blob storage with change notifications.
//!
//! There are no transactions: a `set` with several keys is applied under one
//! lock, but callers doing read-modify-write across `get`/`set` get
//! last-write-wins semantics.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tabshelf_core::{Error, Result};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

pub type Record = Map<String, Value>;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// One key written by `set`.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Values for the requested keys; absent keys are omitted.
    async fn get(&self, keys: &[&str]) -> Result<Record>;
    /// Overwrite the given keys.
    async fn set(&self, items: Record) -> Result<()>;
    /// Change stream; every written key produces one event.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

fn pick(data: &Record, keys: &[&str]) -> Record {
    keys.iter()
        .filter_map(|k| data.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

fn apply(data: &mut Record, items: Record) -> Vec<StorageChange> {
    items
        .into_iter()
        .map(|(key, value)| {
            let old_value = data.insert(key.clone(), value.clone());
            StorageChange {
                key,
                old_value,
                new_value: Some(value),
            }
        })
        .collect()
}

fn publish(tx: &broadcast::Sender<StorageChange>, changes: Vec<StorageChange>) {
    for change in changes {
        // No subscribers is fine.
        let _ = tx.send(change);
    }
}

/// In-process store.
pub struct MemoryBlobStore {
    data: RwLock<Record>,
    changes: broadcast::Sender<StorageChange>,
    writes: AtomicUsize,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::with_data(Record::new())
    }

    pub fn with_data(data: Record) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            data: RwLock::new(data),
            changes,
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Record {
        self.data.read().await.clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, keys: &[&str]) -> Result<Record> {
        let data = self.data.read().await;
        Ok(pick(&data, keys))
    }

    async fn set(&self, items: Record) -> Result<()> {
        let changes = {
            let mut data = self.data.write().await;
            apply(&mut data, items)
        };
        self.writes.fetch_add(1, Ordering::SeqCst);
        publish(&self.changes, changes);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// Whole-document JSON file, rewritten through a temp file and rename so a
/// crash mid-write never leaves a torn file.
pub struct JsonFileBlobStore {
    path: PathBuf,
    data: RwLock<Record>,
    changes: broadcast::Sender<StorageChange>,
}

impl JsonFileBlobStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if tokio::fs::try_exists(&path).await? {
            let content = tokio::fs::read_to_string(&path).await?;
            if content.trim().is_empty() {
                Record::new()
            } else {
                match serde_json::from_str::<Value>(&content)? {
                    Value::Object(map) => map,
                    _ => {
                        return Err(Error::Storage(format!(
                            "{} does not contain a JSON object",
                            path.display()
                        )))
                    }
                }
            }
        } else {
            Record::new()
        };
        info!(path = %path.display(), keys = data.len(), "Opened blob store");

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            data: RwLock::new(data),
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, data: &Record) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(data)?;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "Flushed blob store");
        Ok(())
    }
}

#[async_trait]
impl BlobStore for JsonFileBlobStore {
    async fn get(&self, keys: &[&str]) -> Result<Record> {
        let data = self.data.read().await;
        Ok(pick(&data, keys))
    }

    async fn set(&self, items: Record) -> Result<()> {
        let changes = {
            let mut data = self.data.write().await;
            let mut next = data.clone();
            let changes = apply(&mut next, items);
            self.flush(&next).await?;
            *data = next;
            changes
        };
        publish(&self.changes, changes);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_memory_get_omits_missing_keys() {
        let store = MemoryBlobStore::with_data(record(json!({"a": 1})));
        let got = store.get(&["a", "b"]).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got["a"], 1);
    }

    #[tokio::test]
    async fn test_memory_set_notifies_per_key() {
        let store = MemoryBlobStore::with_data(record(json!({"a": 1})));
        let mut rx = store.subscribe();
        store.set(record(json!({"a": 2, "b": true}))).await.unwrap();

        let mut changes = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        changes.sort_by(|x, y| x.key.cmp(&y.key));
        assert_eq!(changes[0].key, "a");
        assert_eq!(changes[0].old_value, Some(json!(1)));
        assert_eq!(changes[0].new_value, Some(json!(2)));
        assert_eq!(changes[1].key, "b");
        assert_eq!(changes[1].old_value, None);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonFileBlobStore::open(&path).await.unwrap();
        store.set(record(json!({"settings": {"theme": "light"}}))).await.unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        drop(store);

        let reopened = JsonFileBlobStore::open(&path).await.unwrap();
        let got = reopened.get(&["settings"]).await.unwrap();
        assert_eq!(got["settings"]["theme"], "light");
    }

    #[tokio::test]
    async fn test_file_store_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let err = JsonFileBlobStore::open(&path).await.err().unwrap();
        assert!(matches!(err, Error::Storage(_)));
    }
}
