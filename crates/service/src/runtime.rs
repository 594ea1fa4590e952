use std::sync::Arc;
use tabshelf_core::{Config, Result};
use tabshelf_storage::{BlobStore, ShelfStore};
use tokio::task::JoinHandle;
use tracing::info;

use crate::bus::{BusClient, MessageBus};
use crate::dispatcher::Dispatcher;
use crate::host::TabHost;
use crate::settings_cache::SettingsCache;
use crate::shelf::Shelf;
use crate::triggers::{Triggers, UiSurface};

/// Everything wired together: store, settings cache, dispatcher loop and
/// trigger handling.
pub struct ShelfRuntime {
    dispatcher: Dispatcher,
    triggers: Triggers,
    client: BusClient,
    tasks: Vec<JoinHandle<()>>,
}

impl ShelfRuntime {
    pub async fn start(
        config: &Config,
        blob: Arc<dyn BlobStore>,
        host: Arc<dyn TabHost>,
        ui: Arc<dyn UiSurface>,
    ) -> Result<Self> {
        let store = ShelfStore::new(blob);
        let settings = SettingsCache::default();
        settings.init(&store).await?;
        let watcher = settings.watch(&store);

        let bus = MessageBus::new(config.bus_capacity.max(1));
        let client = bus.client();
        let ((_, inbound_rx), broadcast_tx) = bus.split();

        let shelf = Shelf::new(store, host, settings, broadcast_tx)
            .with_ids(config.id_style)
            .with_ui_origin(config.extension.ui_origin());
        let dispatcher = Dispatcher::new(shelf);
        let triggers = Triggers::new(dispatcher.clone(), ui, config.extension.panel_url.clone());
        let serve = tokio::spawn(dispatcher.clone().run(inbound_rx));

        info!(
            commands = dispatcher.registry().names().len(),
            "Shelf runtime started"
        );
        Ok(Self {
            dispatcher,
            triggers,
            client,
            tasks: vec![watcher, serve],
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn triggers(&self) -> &Triggers {
        &self.triggers
    }

    pub fn client(&self) -> BusClient {
        self.client.clone()
    }

    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
        info!("Shelf runtime stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryTabHost, RecordingUi};
    use crate::triggers::TriggerEvent;
    use serde_json::json;
    use tabshelf_core::Broadcast;
    use tabshelf_storage::MemoryBlobStore;

    #[tokio::test]
    async fn test_end_to_end_over_bus() {
        let blob = Arc::new(MemoryBlobStore::new());
        let host = Arc::new(MemoryTabHost::new());
        host.open(1, "https://a.test", "A");
        host.open(1, "https://b.test", "B");

        let runtime = ShelfRuntime::start(
            &Config::default(),
            blob.clone(),
            host.clone(),
            Arc::new(RecordingUi::default()),
        )
        .await
        .unwrap();
        runtime.triggers().handle(TriggerEvent::Installed).await;

        let client = runtime.client();
        let mut broadcasts = client.subscribe();

        let captured = client
            .request(json!({"type": "captureWindow"}))
            .await
            .unwrap()
            .unwrap();
        assert!(captured.ok);
        let group_id = captured.result.unwrap()["id"].as_str().unwrap().to_string();
        assert!(host.tabs().is_empty());

        let resp = client
            .request(json!({"type": "setSettings", "settings": {"showBrowsingTabs": true}}))
            .await
            .unwrap()
            .unwrap();
        assert!(resp.ok);
        assert!(matches!(
            broadcasts.recv().await.unwrap(),
            Broadcast::SettingsChanged { .. }
        ));

        let data = client
            .request(json!({"type": "getData"}))
            .await
            .unwrap()
            .unwrap()
            .result
            .unwrap();
        let ids: Vec<&str> = data["groups"]
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["id"].as_str().unwrap())
            .collect();
        assert_eq!(
            ids,
            vec!["pinned-default", group_id.as_str(), "quick-default", "browsing-live"]
        );
        assert_eq!(data["groups"][3]["type"], "browsing");

        runtime.shutdown();
    }
}
