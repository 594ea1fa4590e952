//! Browser lifecycle events routed onto the same commands the message
//! surface uses.
//!
//! `Triggers::handle` is deliberately not `async`: work that must happen
//! inside the user gesture (opening the side panel) runs before it returns,
//! and everything else is handed back as a future.

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tabshelf_core::{Broadcast, Error, Request, Result, ViewMode};
use tabshelf_storage::StorageChange;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::host::{CreateTab, TabQuery, WindowId};
use crate::shelf::Shelf;

/// Keyboard command that shelves the active tab.
pub const QUICK_CAPTURE_COMMAND: &str = "quick-capture-active";

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    Installed,
    /// Toolbar icon clicked; `window_id` is the window it was clicked in.
    ActionClicked { window_id: Option<WindowId> },
    Command { name: String },
    TabCreated,
    TabRemoved,
    TabUpdated,
    TabActivated,
    StorageChanged(StorageChange),
}

/// Privileged UI calls that only succeed inside a user gesture.
pub trait UiSurface: Send + Sync {
    fn open_side_panel(&self, window_id: WindowId) -> Result<()>;
}

/// No side panel to open.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessUi;

impl UiSurface for HeadlessUi {
    fn open_side_panel(&self, window_id: WindowId) -> Result<()> {
        Err(Error::External(format!(
            "no side panel available for window {}",
            window_id
        )))
    }
}

#[derive(Clone)]
pub struct Triggers {
    dispatcher: Dispatcher,
    ui: Arc<dyn UiSurface>,
    panel_url: String,
}

impl Triggers {
    pub fn new(dispatcher: Dispatcher, ui: Arc<dyn UiSurface>, panel_url: impl Into<String>) -> Self {
        Self {
            dispatcher,
            ui,
            panel_url: panel_url.into(),
        }
    }

    fn shelf(&self) -> &Shelf {
        self.dispatcher.shelf()
    }

    pub fn handle(&self, event: TriggerEvent) -> BoxFuture<'static, ()> {
        match event {
            TriggerEvent::ActionClicked { window_id } => self.action_clicked(window_id),
            other => {
                let this = self.clone();
                async move { this.handle_deferred(other).await }.boxed()
            }
        }
    }

    fn action_clicked(&self, window_id: Option<WindowId>) -> BoxFuture<'static, ()> {
        // Cache read only: an await here would forfeit the gesture.
        let view_mode = self.shelf().settings().get().view_mode;
        let this = self.clone();

        match (view_mode, window_id) {
            (ViewMode::Tab, _) => async move { this.open_panel_tab().await }.boxed(),
            (ViewMode::Side, Some(window_id)) => {
                let opened = self.open_side_panel(window_id);
                async move {
                    if opened {
                        this.shelf().close_tabs_with_url(&this.panel_url).await;
                    }
                }
                .boxed()
            }
            (ViewMode::Side, None) => async move {
                // Resolving the window first may already cost the gesture.
                match this.shelf().host().current_window().await {
                    Ok(window_id) => {
                        if this.open_side_panel(window_id) {
                            this.shelf().close_tabs_with_url(&this.panel_url).await;
                        }
                    }
                    Err(e) => error!(error = %e, "Could not resolve a window for the side panel"),
                }
            }
            .boxed(),
        }
    }

    fn open_side_panel(&self, window_id: WindowId) -> bool {
        match self.ui.open_side_panel(window_id) {
            Ok(()) => {
                debug!(window_id, "Opened side panel");
                true
            }
            Err(e) => {
                error!(window_id, error = %e, "Side panel open failed");
                false
            }
        }
    }

    async fn open_panel_tab(&self) {
        let host = self.shelf().host();
        let existing = match host.query(TabQuery::with_url(&self.panel_url)).await {
            Ok(tabs) => tabs,
            Err(e) => {
                error!(error = %e, "Failed to look up panel tab");
                return;
            }
        };
        let result = match existing.first() {
            Some(tab) => host.activate(tab.id).await,
            None => host
                .create(CreateTab {
                    url: self.panel_url.clone(),
                    active: true,
                })
                .await
                .map(|_| ()),
        };
        if let Err(e) = result {
            error!(error = %e, "Failed to open panel tab");
        }
    }

    async fn handle_deferred(&self, event: TriggerEvent) {
        match event {
            TriggerEvent::Installed => {
                if let Err(e) = self.shelf().settings().install(self.shelf().store()).await {
                    error!(error = %e, "Failed to initialize settings");
                } else {
                    info!("Installed");
                }
            }
            TriggerEvent::Command { name } if name == QUICK_CAPTURE_COMMAND => {
                let response = self.dispatcher.send(Request::QuickCapture).await;
                if !response.ok {
                    error!(message = ?response.message, "Quick capture failed");
                }
            }
            TriggerEvent::Command { name } => {
                warn!(name = %name, "Unknown keyboard command");
            }
            TriggerEvent::TabCreated
            | TriggerEvent::TabRemoved
            | TriggerEvent::TabUpdated
            | TriggerEvent::TabActivated => {
                if self.shelf().settings().get().show_browsing_tabs {
                    self.shelf().broadcast(Broadcast::ReloadData);
                }
            }
            TriggerEvent::StorageChanged(change) => {
                if self.shelf().settings().apply_change(&change) {
                    debug!("Settings cache refreshed");
                }
            }
            TriggerEvent::ActionClicked { window_id } => self.action_clicked(window_id).await,
        }
    }
}
