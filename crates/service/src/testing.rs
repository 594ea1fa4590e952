//! In-memory tab host and UI surface for unit tests.

use async_trait::async_trait;
use std::sync::Mutex;
use tabshelf_core::{Error, Result};

use crate::host::{CreateTab, HostTab, HostTabId, TabHost, TabQuery, WindowId};
use crate::triggers::UiSurface;

#[derive(Default)]
struct HostState {
    tabs: Vec<HostTab>,
    focused: Option<WindowId>,
    next_id: HostTabId,
    created: Vec<CreateTab>,
    removed: Vec<HostTabId>,
    activated: Vec<HostTabId>,
    focused_windows: Vec<WindowId>,
    fail_remove: bool,
}

pub struct MemoryTabHost {
    state: Mutex<HostState>,
}

impl MemoryTabHost {
    /// Empty host whose focused window is `1`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState {
                focused: Some(1),
                next_id: 100,
                ..HostState::default()
            }),
        }
    }

    fn push(&self, tab: HostTab) -> HostTabId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.tabs.push(HostTab { id, ..tab });
        id
    }

    pub fn open(&self, window_id: WindowId, url: &str, title: &str) -> HostTabId {
        self.push(HostTab {
            window_id,
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            fav_icon_url: Some(format!("{}/favicon.ico", url)),
            ..HostTab::default()
        })
    }

    pub fn open_untitled(&self, window_id: WindowId, url: &str) -> HostTabId {
        self.push(HostTab {
            window_id,
            url: Some(url.to_string()),
            ..HostTab::default()
        })
    }

    pub fn open_without_url(&self, window_id: WindowId) -> HostTabId {
        self.push(HostTab {
            window_id,
            ..HostTab::default()
        })
    }

    pub fn open_pinned(&self, window_id: WindowId, url: &str) -> HostTabId {
        self.push(HostTab {
            window_id,
            url: Some(url.to_string()),
            pinned: true,
            ..HostTab::default()
        })
    }

    pub fn set_active(&self, tab_id: HostTabId) {
        let mut state = self.state.lock().unwrap();
        let window = state.tabs.iter().find(|t| t.id == tab_id).map(|t| t.window_id);
        for tab in state.tabs.iter_mut() {
            if Some(tab.window_id) == window {
                tab.active = tab.id == tab_id;
            }
        }
    }

    pub fn focus(&self, window_id: WindowId) {
        self.state.lock().unwrap().focused = Some(window_id);
    }

    pub fn unfocus(&self) {
        self.state.lock().unwrap().focused = None;
    }

    pub fn fail_removals(&self) {
        self.state.lock().unwrap().fail_remove = true;
    }

    pub fn close(&self, tab_id: HostTabId) {
        self.state.lock().unwrap().tabs.retain(|t| t.id != tab_id);
    }

    pub fn tabs(&self) -> Vec<HostTab> {
        self.state.lock().unwrap().tabs.clone()
    }

    pub fn created(&self) -> Vec<CreateTab> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn removed(&self) -> Vec<HostTabId> {
        self.state.lock().unwrap().removed.clone()
    }

    pub fn activated(&self) -> Vec<HostTabId> {
        self.state.lock().unwrap().activated.clone()
    }

    pub fn focused_windows(&self) -> Vec<WindowId> {
        self.state.lock().unwrap().focused_windows.clone()
    }
}

#[async_trait]
impl TabHost for MemoryTabHost {
    async fn current_window(&self) -> Result<WindowId> {
        self.state
            .lock()
            .unwrap()
            .focused
            .ok_or_else(|| Error::NotFound("no focused window".to_string()))
    }

    async fn query(&self, query: TabQuery) -> Result<Vec<HostTab>> {
        let state = self.state.lock().unwrap();
        Ok(state.tabs.iter().filter(|t| query.matches(t)).cloned().collect())
    }

    async fn get(&self, tab_id: HostTabId) -> Result<HostTab> {
        let state = self.state.lock().unwrap();
        state
            .tabs
            .iter()
            .find(|t| t.id == tab_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("tab {}", tab_id)))
    }

    async fn create(&self, props: CreateTab) -> Result<HostTab> {
        let window_id = self.state.lock().unwrap().focused.unwrap_or(1);
        let id = self.push(HostTab {
            window_id,
            url: Some(props.url.clone()),
            active: props.active,
            ..HostTab::default()
        });
        let mut state = self.state.lock().unwrap();
        state.created.push(props);
        state
            .tabs
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Error::External("created tab vanished".to_string()))
    }

    async fn remove(&self, tab_ids: &[HostTabId]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_remove {
            return Err(Error::External("tabs.remove rejected".to_string()));
        }
        for id in tab_ids {
            if !state.tabs.iter().any(|t| t.id == *id) {
                return Err(Error::External(format!("No tab with id: {}", id)));
            }
            state.tabs.retain(|t| t.id != *id);
            state.removed.push(*id);
        }
        Ok(())
    }

    async fn activate(&self, tab_id: HostTabId) -> Result<()> {
        {
            let state = self.state.lock().unwrap();
            if !state.tabs.iter().any(|t| t.id == tab_id) {
                return Err(Error::External(format!("No tab with id: {}", tab_id)));
            }
        }
        self.set_active(tab_id);
        self.state.lock().unwrap().activated.push(tab_id);
        Ok(())
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.focused = Some(window_id);
        state.focused_windows.push(window_id);
        Ok(())
    }
}

/// Records side-panel opens; optionally refuses them.
#[derive(Default)]
pub struct RecordingUi {
    opened: Mutex<Vec<WindowId>>,
    refuse: bool,
}

impl RecordingUi {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<WindowId> {
        self.opened.lock().unwrap().clone()
    }
}

impl UiSurface for RecordingUi {
    fn open_side_panel(&self, window_id: WindowId) -> Result<()> {
        if self.refuse {
            return Err(Error::External("side panel unavailable".to_string()));
        }
        self.opened.lock().unwrap().push(window_id);
        Ok(())
    }
}
