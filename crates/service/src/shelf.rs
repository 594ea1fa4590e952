//! Mutation handlers over the persisted shelf.
//!
//! Every handler reads the canonical group list, applies one change and
//! writes the whole list back. There is no locking between handlers: two
//! overlapping read-modify-write cycles resolve as last-write-wins.

use chrono::{Local, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tabshelf_core::types::{DEFAULT_USER_GROUP_NAME, QUICK_GROUP_ID};
use tabshelf_core::{
    Broadcast, Error, Group, GroupKind, IdGenerator, Result, Settings, Tab, UserGroupSummary,
};
use tabshelf_storage::ShelfStore;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::host::{CreateTab, HostTab, HostTabId, TabHost, TabQuery, WindowId};
use crate::live;
use crate::reconcile::reconcile;
use crate::reorder::{self, Move, MoveOutcome};
use crate::settings_cache::SettingsCache;

/// Payload of `getData`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShelfState {
    pub groups: Vec<Group>,
    pub settings: Settings,
}

#[derive(Clone)]
pub struct Shelf {
    store: ShelfStore,
    host: Arc<dyn TabHost>,
    settings: SettingsCache,
    broadcasts: broadcast::Sender<Broadcast>,
    ids: IdGenerator,
    ui_origin: String,
}

impl Shelf {
    pub fn new(
        store: ShelfStore,
        host: Arc<dyn TabHost>,
        settings: SettingsCache,
        broadcasts: broadcast::Sender<Broadcast>,
    ) -> Self {
        Self {
            store,
            host,
            settings,
            broadcasts,
            ids: IdGenerator::default(),
            ui_origin: String::new(),
        }
    }

    pub fn with_ids(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// URL prefix of the extension's own pages, hidden from the live group.
    pub fn with_ui_origin(mut self, origin: impl Into<String>) -> Self {
        self.ui_origin = origin.into();
        self
    }

    pub fn store(&self) -> &ShelfStore {
        &self.store
    }

    pub fn host(&self) -> &Arc<dyn TabHost> {
        &self.host
    }

    pub fn settings(&self) -> &SettingsCache {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.broadcasts.subscribe()
    }

    /// Best-effort notification; nobody listening is not an error.
    pub fn broadcast(&self, message: Broadcast) {
        if self.broadcasts.send(message).is_err() {
            debug!("No listeners for broadcast");
        }
    }

    async fn load_groups(&self) -> Result<Vec<Group>> {
        Ok(reconcile(self.store.read_groups().await?))
    }

    async fn save_groups(&self, groups: &[Group]) -> Result<()> {
        self.store.write_groups(groups).await
    }

    fn shelved_tab(&self, tab: &HostTab) -> Option<Tab> {
        let url = tab.url.as_deref().filter(|u| !u.is_empty())?;
        Some(Tab::new(
            self.ids.next("tab"),
            url,
            tab.title.as_deref().unwrap_or_default(),
            tab.fav_icon_url.as_deref().unwrap_or_default(),
        ))
    }

    // ---------- capture ----------

    /// Shelve every browser-unpinned tab of the focused window into a new
    /// group, then close the originals. Closing is not rolled back: if it
    /// fails the new group stays stored while the tabs remain open.
    pub async fn capture_window(&self) -> Result<Group> {
        let window_id = self.host.current_window().await?;
        let open = self.host.query(TabQuery::in_window(window_id)).await?;
        let (captured, host_ids): (Vec<Tab>, Vec<HostTabId>) = open
            .iter()
            .filter(|t| !t.pinned)
            .filter_map(|t| self.shelved_tab(t).map(|tab| (tab, t.id)))
            .unzip();

        if captured.is_empty() {
            return Err(Error::Empty("the current window has no tabs to shelve".to_string()));
        }

        let now = Local::now();
        let mut group = Group::user(
            self.ids.next("group"),
            &format!("Shelved {}", now.format("%Y-%m-%d %H:%M:%S")),
            now.timestamp_millis(),
        );
        group.tabs = captured;

        let mut groups = self.load_groups().await?;
        groups.insert(1, group.clone());
        self.save_groups(&groups).await?;
        info!(group_id = %group.id, tabs = group.tabs.len(), window_id, "Captured window");

        if let Err(e) = self.host.remove(&host_ids).await {
            error!(group_id = %group.id, error = %e, "Captured tabs stored but closing them failed");
            return Err(e);
        }
        Ok(group)
    }

    /// Shelve the focused window's active tab at the head of the
    /// quick-capture group. Identical URLs are not deduplicated.
    pub async fn capture_active_tab(&self) -> Result<Tab> {
        let window_id = self.host.current_window().await?;
        let query = TabQuery {
            window_id: Some(window_id),
            active: Some(true),
            ..TabQuery::default()
        };
        let active = self.host.query(query).await?.into_iter().next();
        let (tab, host_id) = active
            .and_then(|t| self.shelved_tab(&t).map(|tab| (tab, t.id)))
            .ok_or_else(|| Error::Empty("there is no active tab to shelve".to_string()))?;

        let mut groups = self.load_groups().await?;
        find_group(&mut groups, QUICK_GROUP_ID)?.tabs.insert(0, tab.clone());
        self.save_groups(&groups).await?;
        self.host.remove(&[host_id]).await?;
        info!(tab_id = %tab.id, "Quick-captured active tab");

        self.broadcast(Broadcast::ReloadData);
        Ok(tab)
    }

    // ---------- reads ----------

    /// Canonical groups plus, when enabled, the live browsing group.
    pub async fn get_data(&self, window_id: Option<WindowId>) -> Result<ShelfState> {
        let stored = self.store.load().await?;
        let mut groups = reconcile(stored.groups);
        if stored.settings.show_browsing_tabs {
            let live = live::snapshot(self.host.as_ref(), &self.ui_origin, window_id).await?;
            groups.push(live);
        }
        Ok(ShelfState {
            groups,
            settings: stored.settings,
        })
    }

    pub async fn user_groups(&self) -> Result<Vec<UserGroupSummary>> {
        Ok(self
            .load_groups()
            .await?
            .iter()
            .filter(|g| g.kind == GroupKind::User)
            .map(UserGroupSummary::from)
            .collect())
    }

    // ---------- settings ----------

    pub async fn set_settings(&self, patch: &Map<String, Value>) -> Result<Settings> {
        let merged = self.store.read_settings().await?.merge_patch(patch);
        self.store.write_settings(&merged).await?;
        self.settings.replace(merged.clone());
        info!(keys = patch.len(), "Updated settings");
        self.broadcast(Broadcast::SettingsChanged {
            settings: merged.clone(),
        });
        Ok(merged)
    }

    // ---------- group edits ----------

    pub async fn add_group(&self, name: Option<&str>) -> Result<Group> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_USER_GROUP_NAME);
        let group = Group::user(self.ids.next("group"), name, Utc::now().timestamp_millis());

        let mut groups = self.load_groups().await?;
        groups.insert(1, group.clone());
        self.save_groups(&groups).await?;
        debug!(group_id = %group.id, "Added group");
        Ok(group)
    }

    /// An empty name keeps the current one. System group names are fixed,
    /// so renaming them returns the group as-is.
    pub async fn rename_group(&self, group_id: &str, name: &str) -> Result<Group> {
        match GroupKind::of(group_id) {
            GroupKind::LiveBrowsing => {
                return Err(Error::Forbidden("the browsing group cannot be renamed".to_string()))
            }
            GroupKind::Pinned | GroupKind::QuickCapture => {
                let mut groups = self.load_groups().await?;
                debug!(group_id, "Ignoring rename of system group");
                return Ok(find_group(&mut groups, group_id)?.clone());
            }
            GroupKind::User => {}
        }

        let mut groups = self.load_groups().await?;
        let group = find_group(&mut groups, group_id)?;
        if !name.trim().is_empty() {
            group.name = name.to_string();
        }
        let renamed = group.clone();
        self.save_groups(&groups).await?;
        Ok(renamed)
    }

    pub async fn set_group_persistent(&self, group_id: &str, persistent: bool) -> Result<Group> {
        match GroupKind::of(group_id) {
            GroupKind::LiveBrowsing => {
                return Err(Error::Forbidden(
                    "the browsing group's persistence cannot be changed".to_string(),
                ))
            }
            GroupKind::Pinned | GroupKind::QuickCapture => {
                return Err(Error::Forbidden(
                    "system groups have fixed persistence".to_string(),
                ))
            }
            GroupKind::User => {}
        }

        let mut groups = self.load_groups().await?;
        let group = find_group(&mut groups, group_id)?;
        group.persistent = persistent;
        let updated = group.clone();
        self.save_groups(&groups).await?;
        Ok(updated)
    }

    pub async fn clear_group(&self, group_id: &str) -> Result<()> {
        match GroupKind::of(group_id) {
            GroupKind::LiveBrowsing => {
                return Err(Error::Forbidden("the browsing group cannot be cleared".to_string()))
            }
            GroupKind::Pinned | GroupKind::QuickCapture | GroupKind::User => {}
        }

        let mut groups = self.load_groups().await?;
        find_group(&mut groups, group_id)?.tabs.clear();
        self.save_groups(&groups).await
    }

    /// Hard delete. System groups and persistent groups are protected.
    pub async fn remove_group(&self, group_id: &str) -> Result<()> {
        match GroupKind::of(group_id) {
            GroupKind::LiveBrowsing => {
                return Err(Error::Forbidden("the browsing group cannot be removed".to_string()))
            }
            GroupKind::Pinned | GroupKind::QuickCapture => {
                return Err(Error::Forbidden("system groups cannot be removed".to_string()))
            }
            GroupKind::User => {}
        }

        let mut groups = self.load_groups().await?;
        if find_group(&mut groups, group_id)?.persistent {
            return Err(Error::Forbidden(
                "persistent groups cannot be removed".to_string(),
            ));
        }
        groups.retain(|g| g.id != group_id);
        self.save_groups(&groups).await?;
        info!(group_id, "Removed group");
        Ok(())
    }

    // ---------- tab edits ----------

    /// An empty title keeps the current custom title.
    pub async fn rename_tab(&self, group_id: &str, tab_id: &str, title: &str) -> Result<Tab> {
        if GroupKind::of(group_id).is_live() {
            return Err(Error::Forbidden("live tabs cannot be renamed".to_string()));
        }

        let mut groups = self.load_groups().await?;
        let tab = find_tab(find_group(&mut groups, group_id)?, tab_id)?;
        if !title.trim().is_empty() {
            tab.custom_title = title.to_string();
        }
        let renamed = tab.clone();
        self.save_groups(&groups).await?;
        Ok(renamed)
    }

    pub async fn remove_tab(&self, group_id: &str, tab_id: &str) -> Result<()> {
        if GroupKind::of(group_id).is_live() {
            return Err(Error::Forbidden(
                "live tabs cannot be removed from the shelf, close them instead".to_string(),
            ));
        }

        let mut groups = self.load_groups().await?;
        let group = find_group(&mut groups, group_id)?;
        let index = group
            .tab_index(tab_id)
            .ok_or_else(|| Error::NotFound(format!("tab {}", tab_id)))?;
        group.tabs.remove(index);
        self.save_groups(&groups).await
    }

    pub async fn move_tab(&self, mv: &Move<'_>) -> Result<()> {
        if GroupKind::of(mv.from_group_id).is_live() || GroupKind::of(mv.to_group_id).is_live() {
            return Err(Error::Forbidden(
                "tabs cannot be dragged into or out of the browsing group".to_string(),
            ));
        }

        let mut groups = self.load_groups().await?;
        match reorder::apply(&mut groups, mv)? {
            MoveOutcome::Moved => self.save_groups(&groups).await,
            MoveOutcome::Unchanged => Ok(()),
        }
    }

    // ---------- restore ----------

    /// Reopen a shelved tab. Non-persistent groups give the record up; for
    /// the live group this focuses the already open tab instead.
    pub async fn restore_tab(&self, group_id: &str, tab_id: &str, active: bool) -> Result<()> {
        match GroupKind::of(group_id) {
            GroupKind::LiveBrowsing => return self.focus_live_tab(tab_id).await,
            GroupKind::Pinned | GroupKind::QuickCapture | GroupKind::User => {}
        }

        let mut groups = self.load_groups().await?;
        let group = find_group(&mut groups, group_id)?;
        let index = group
            .tab_index(tab_id)
            .ok_or_else(|| Error::NotFound(format!("tab {}", tab_id)))?;

        self.host
            .create(CreateTab {
                url: group.tabs[index].url.clone(),
                active,
            })
            .await?;

        if group.persistent {
            return Ok(());
        }
        group.tabs.remove(index);
        self.save_groups(&groups).await
    }

    async fn focus_live_tab(&self, tab_id: &str) -> Result<()> {
        let host_id = Tab::parse_live_id(tab_id)
            .ok_or_else(|| Error::NotFound(format!("tab {}", tab_id)))?;
        let tab = self.host.get(host_id).await.map_err(|e| {
            debug!(host_id, error = %e, "Live tab lookup failed");
            Error::External("tab already closed".to_string())
        })?;
        self.host.activate(tab.id).await?;
        self.host.focus_window(tab.window_id).await
    }

    /// Reopen every tab in order, one at a time. A non-persistent group is
    /// emptied afterwards but kept.
    pub async fn restore_group(&self, group_id: &str) -> Result<()> {
        match GroupKind::of(group_id) {
            GroupKind::LiveBrowsing => {
                return Err(Error::Forbidden(
                    "the browsing group is already open".to_string(),
                ))
            }
            GroupKind::Pinned | GroupKind::QuickCapture | GroupKind::User => {}
        }

        let mut groups = self.load_groups().await?;
        let group = find_group(&mut groups, group_id)?;
        for tab in &group.tabs {
            self.host
                .create(CreateTab {
                    url: tab.url.clone(),
                    active: false,
                })
                .await?;
        }
        info!(group_id, tabs = group.tabs.len(), "Restored group");

        if group.persistent || group.tabs.is_empty() {
            return Ok(());
        }
        group.tabs.clear();
        self.save_groups(&groups).await
    }

    // ---------- live tabs ----------

    pub async fn close_live_tab(&self, host_id: HostTabId) -> Result<()> {
        self.host.remove(&[host_id]).await?;
        self.broadcast(Broadcast::ReloadData);
        Ok(())
    }

    /// Close any open tab showing `url`, swallowing failures.
    pub async fn close_tabs_with_url(&self, url: &str) {
        let tabs = match self.host.query(TabQuery::with_url(url)).await {
            Ok(tabs) => tabs,
            Err(e) => {
                debug!(error = %e, "Could not look up tabs to close");
                return;
            }
        };
        if tabs.is_empty() {
            return;
        }
        let ids: Vec<HostTabId> = tabs.iter().map(|t| t.id).collect();
        if let Err(e) = self.host.remove(&ids).await {
            warn!(error = %e, "Could not close lingering tabs");
        }
    }
}

fn find_group<'a>(groups: &'a mut [Group], group_id: &str) -> Result<&'a mut Group> {
    groups
        .iter_mut()
        .find(|g| g.id == group_id)
        .ok_or_else(|| Error::NotFound(format!("group {}", group_id)))
}

fn find_tab<'a>(group: &'a mut Group, tab_id: &str) -> Result<&'a mut Tab> {
    group
        .tab_mut(tab_id)
        .ok_or_else(|| Error::NotFound(format!("tab {}", tab_id)))
}
