//! Process-wide copy of the settings record with synchronous reads.
//!
//! Trigger handlers that must act inside a user gesture read from here
//! instead of awaiting the store.

use std::sync::{Arc, RwLock};
use tabshelf_core::{Result, Settings};
use tabshelf_storage::{is_settings_change, ShelfStore, StorageChange};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Clone, Default)]
pub struct SettingsCache {
    inner: Arc<RwLock<Settings>>,
}

impl SettingsCache {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn get(&self) -> Settings {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, settings: Settings) {
        match self.inner.write() {
            Ok(mut guard) => *guard = settings,
            Err(poisoned) => *poisoned.into_inner() = settings,
        }
    }

    /// Refresh from the store. Missing settings leave the defaults in place.
    pub async fn init(&self, store: &ShelfStore) -> Result<()> {
        let settings = store.read_settings().await?;
        debug!(view_mode = ?settings.view_mode, "Loaded settings into cache");
        self.replace(settings);
        Ok(())
    }

    /// First-install setup: persist defaults when nothing is stored yet,
    /// otherwise merge the stored record over the defaults.
    pub async fn install(&self, store: &ShelfStore) -> Result<()> {
        match store.read_settings_raw().await? {
            None => {
                let defaults = Settings::default();
                store.write_settings(&defaults).await?;
                info!("Wrote default settings");
                self.replace(defaults);
            }
            Some(raw) => self.replace(Settings::from_stored(Some(&raw))),
        }
        Ok(())
    }

    /// Apply one change notification. Returns `true` when the cache moved.
    pub fn apply_change(&self, change: &StorageChange) -> bool {
        if !is_settings_change(change) {
            return false;
        }
        self.replace(Settings::from_stored(change.new_value.as_ref()));
        true
    }

    /// Keep the cache in step with store change notifications.
    pub fn watch(&self, store: &ShelfStore) -> JoinHandle<()> {
        let cache = self.clone();
        let mut changes = store.subscribe();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        if cache.apply_change(&change) {
                            debug!("Settings cache refreshed from store");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Settings watcher lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tabshelf_core::ViewMode;
    use tabshelf_storage::{MemoryBlobStore, SETTINGS_KEY};

    fn store() -> (Arc<MemoryBlobStore>, ShelfStore) {
        let blob = Arc::new(MemoryBlobStore::new());
        (blob.clone(), ShelfStore::new(blob))
    }

    #[tokio::test]
    async fn test_install_writes_defaults_once() {
        let (blob, store) = store();
        let cache = SettingsCache::default();
        cache.install(&store).await.unwrap();
        assert_eq!(blob.write_count(), 1);
        assert!(store.read_settings_raw().await.unwrap().is_some());

        cache.install(&store).await.unwrap();
        assert_eq!(blob.write_count(), 1);
    }

    #[tokio::test]
    async fn test_install_merges_existing() {
        let (_, store) = store();
        let mut stored = Settings::default();
        stored.view_mode = ViewMode::Tab;
        store.write_settings(&stored).await.unwrap();

        let cache = SettingsCache::default();
        cache.install(&store).await.unwrap();
        assert_eq!(cache.get().view_mode, ViewMode::Tab);
    }

    #[test]
    fn test_apply_change_ignores_other_keys() {
        let cache = SettingsCache::default();
        let change = StorageChange {
            key: "groups".into(),
            old_value: None,
            new_value: Some(json!([])),
        };
        assert!(!cache.apply_change(&change));

        let change = StorageChange {
            key: SETTINGS_KEY.into(),
            old_value: None,
            new_value: Some(json!({"viewMode": "tab"})),
        };
        assert!(cache.apply_change(&change));
        assert_eq!(cache.get().view_mode, ViewMode::Tab);
    }

    #[tokio::test]
    async fn test_watch_follows_external_writes() {
        let (_, store) = store();
        let cache = SettingsCache::default();
        let handle = cache.watch(&store);

        let mut next = Settings::default();
        next.show_browsing_tabs = true;
        store.write_settings(&next).await.unwrap();

        for _ in 0..50 {
            if cache.get().show_browsing_tabs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(cache.get().show_browsing_tabs);
        handle.abort();
    }
}
