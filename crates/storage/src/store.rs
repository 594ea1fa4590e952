use serde_json::Value;
use std::sync::Arc;
use tabshelf_core::{Group, Result, Settings};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::blob::{BlobStore, Record, StorageChange};

pub const GROUPS_KEY: &str = "groups";
pub const SETTINGS_KEY: &str = "settings";

/// Raw persisted records, before reconciliation.
#[derive(Debug, Clone, Default)]
pub struct StoredState {
    pub groups: Vec<Group>,
    pub settings: Settings,
}

/// Typed access to the `groups` and `settings` records.
#[derive(Clone)]
pub struct ShelfStore {
    blob: Arc<dyn BlobStore>,
}

impl ShelfStore {
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self { blob }
    }

    pub fn blob(&self) -> &Arc<dyn BlobStore> {
        &self.blob
    }

    pub async fn load(&self) -> Result<StoredState> {
        let stored = self.blob.get(&[GROUPS_KEY, SETTINGS_KEY]).await?;
        Ok(StoredState {
            groups: split_groups(stored.get(GROUPS_KEY)).0,
            settings: Settings::from_stored(stored.get(SETTINGS_KEY)),
        })
    }

    pub async fn read_groups(&self) -> Result<Vec<Group>> {
        let stored = self.blob.get(&[GROUPS_KEY]).await?;
        Ok(split_groups(stored.get(GROUPS_KEY)).0)
    }

    /// The settings record exactly as stored, if any.
    pub async fn read_settings_raw(&self) -> Result<Option<Value>> {
        let mut stored = self.blob.get(&[SETTINGS_KEY]).await?;
        Ok(stored.remove(SETTINGS_KEY))
    }

    pub async fn read_settings(&self) -> Result<Settings> {
        let raw = self.read_settings_raw().await?;
        Ok(Settings::from_stored(raw.as_ref()))
    }

    /// Persist the group list. The live browsing group is dropped here no
    /// matter what the caller passes in.
    ///
    /// Stored entries that could not be decoded are carried over after the
    /// given groups instead of being lost.
    pub async fn write_groups(&self, groups: &[Group]) -> Result<()> {
        let persisted: Vec<&Group> = groups.iter().filter(|g| !g.kind.is_live()).collect();
        if persisted.len() != groups.len() {
            debug!("Dropped live browsing group from groups write");
        }
        let mut records = persisted
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<Value>>>()?;

        let stored = self.blob.get(&[GROUPS_KEY]).await?;
        let (_, unreadable) = split_groups(stored.get(GROUPS_KEY));
        if !unreadable.is_empty() {
            warn!(count = unreadable.len(), "Keeping unreadable group records");
            records.extend(unreadable);
        }

        let mut items = Record::new();
        items.insert(GROUPS_KEY.to_string(), Value::Array(records));
        self.blob.set(items).await
    }

    pub async fn write_settings(&self, settings: &Settings) -> Result<()> {
        let mut items = Record::new();
        items.insert(SETTINGS_KEY.to_string(), serde_json::to_value(settings)?);
        self.blob.set(items).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.blob.subscribe()
    }
}

/// Decode the stored group array. Entries that no longer parse come back
/// raw in the second list.
fn split_groups(value: Option<&Value>) -> (Vec<Group>, Vec<Value>) {
    let Some(value) = value else {
        return (Vec::new(), Vec::new());
    };
    let Some(items) = value.as_array() else {
        warn!("Stored groups record is not an array, ignoring it");
        return (Vec::new(), Vec::new());
    };
    let mut groups = Vec::with_capacity(items.len());
    let mut unreadable = Vec::new();
    for item in items {
        match serde_json::from_value::<Group>(item.clone()) {
            Ok(group) => groups.push(group),
            Err(e) => {
                warn!(error = %e, "Failed to parse stored group, hiding it");
                unreadable.push(item.clone());
            }
        }
    }
    (groups, unreadable)
}

/// `true` when a change notification concerns the settings record.
pub fn is_settings_change(change: &StorageChange) -> bool {
    change.key == SETTINGS_KEY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use serde_json::json;
    use tabshelf_core::{Tab, Theme};

    fn store_with(data: Value) -> (Arc<MemoryBlobStore>, ShelfStore) {
        let blob = Arc::new(MemoryBlobStore::with_data(
            data.as_object().cloned().unwrap_or_default(),
        ));
        (blob.clone(), ShelfStore::new(blob))
    }

    #[tokio::test]
    async fn test_empty_store_loads_defaults() {
        let (_, store) = store_with(json!({}));
        let state = store.load().await.unwrap();
        assert!(state.groups.is_empty());
        assert_eq!(state.settings, Settings::default());
        assert!(store.read_settings_raw().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_groups_never_persists_live_group() {
        let (blob, store) = store_with(json!({}));
        let mut user = Group::user("g1".into(), "Reading", 1);
        user.tabs.push(Tab::new("t1".into(), "https://a.test", "A", ""));
        let groups = vec![
            Group::pinned(),
            Group::live(vec![Tab::live(9, "https://live.test", "L", "")]),
            user,
            Group::quick_capture(),
            Group::live(Vec::new()),
        ];
        store.write_groups(&groups).await.unwrap();

        let raw = blob.snapshot().await;
        let ids: Vec<&str> = raw[GROUPS_KEY]
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["pinned-default", "g1", "quick-default"]);
        assert!(!raw[GROUPS_KEY].to_string().contains("browsing"));
    }

    #[tokio::test]
    async fn test_corrupt_group_entries_are_hidden_but_kept() {
        let (blob, store) = store_with(json!({
            "groups": [
                {"id": "g1", "name": "ok", "tabs": []},
                {"name": "missing id", "tabs": [{"id": "t", "url": "https://kept.test"}]},
                "garbage"
            ]
        }));
        let groups = store.read_groups().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "g1");

        store.write_groups(&groups).await.unwrap();
        let raw = blob.snapshot().await;
        let items = raw[GROUPS_KEY].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["id"], "g1");
        assert_eq!(items[1]["tabs"][0]["url"], "https://kept.test");
        assert_eq!(items[2], "garbage");
    }

    #[tokio::test]
    async fn test_drifted_group_survives_rewrite() {
        let (blob, store) = store_with(json!({
            "groups": [
                {"id": "g1", "name": "one", "createdAt": 1, "tabs": []},
                {"id": "g2", "name": "two", "createdAt": "yesterday",
                 "tabs": [{"id": "t", "url": "https://x"}]}
            ]
        }));
        let groups = store.read_groups().await.unwrap();
        assert_eq!(groups.len(), 2);
        store.write_groups(&groups).await.unwrap();

        let raw = blob.snapshot().await;
        let items = raw[GROUPS_KEY].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["id"], "g2");
        assert_eq!(items[1]["createdAt"], 0);
        assert_eq!(items[1]["tabs"][0]["url"], "https://x");
    }

    #[tokio::test]
    async fn test_settings_round_trip_keeps_unknown_keys() {
        let (_, store) = store_with(json!({"settings": {"theme": "light", "accent": "teal"}}));
        let settings = store.read_settings().await.unwrap();
        assert_eq!(settings.theme, Theme::Light);
        store.write_settings(&settings).await.unwrap();
        let raw = store.read_settings_raw().await.unwrap().unwrap();
        assert_eq!(raw["accent"], "teal");
        assert_eq!(raw["viewMode"], "side");
    }

    #[tokio::test]
    async fn test_stale_snapshot_write_wins() {
        // Two read-modify-write cycles that overlap: the later write
        // replaces the earlier one wholesale.
        let (_, store) = store_with(json!({}));
        store
            .write_groups(&[Group::pinned(), Group::quick_capture()])
            .await
            .unwrap();

        let mut first = store.read_groups().await.unwrap();
        let mut second = store.read_groups().await.unwrap();
        first.insert(1, Group::user("a".into(), "A", 1));
        second.insert(1, Group::user("b".into(), "B", 2));
        store.write_groups(&first).await.unwrap();
        store.write_groups(&second).await.unwrap();

        let ids: Vec<String> = store
            .read_groups()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec!["pinned-default", "b", "quick-default"]);
    }
}
