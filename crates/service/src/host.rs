//! The browser's tab/window API as seen by the shelf.
//!
//! Every call is fallible I/O. Implementations map host rejections to
//! `Error::External` and lookup misses to `Error::NotFound`.

use async_trait::async_trait;
use tabshelf_core::{Error, Result};

pub type HostTabId = i64;
pub type WindowId = i64;

/// A real, open browser tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostTab {
    pub id: HostTabId,
    pub window_id: WindowId,
    pub url: Option<String>,
    pub title: Option<String>,
    pub fav_icon_url: Option<String>,
    /// The browser's own pinning, unrelated to the pinned group.
    pub pinned: bool,
    pub active: bool,
}

/// Filter for `TabHost::query`. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabQuery {
    pub window_id: Option<WindowId>,
    pub active: Option<bool>,
    pub url: Option<String>,
}

impl TabQuery {
    pub fn in_window(window_id: WindowId) -> Self {
        Self {
            window_id: Some(window_id),
            ..Self::default()
        }
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, tab: &HostTab) -> bool {
        self.window_id.map_or(true, |w| tab.window_id == w)
            && self.active.map_or(true, |a| tab.active == a)
            && self
                .url
                .as_deref()
                .map_or(true, |u| tab.url.as_deref() == Some(u))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTab {
    pub url: String,
    pub active: bool,
}

#[async_trait]
pub trait TabHost: Send + Sync {
    /// The focused window.
    async fn current_window(&self) -> Result<WindowId>;
    async fn query(&self, query: TabQuery) -> Result<Vec<HostTab>>;
    async fn get(&self, tab_id: HostTabId) -> Result<HostTab>;
    async fn create(&self, props: CreateTab) -> Result<HostTab>;
    async fn remove(&self, tab_ids: &[HostTabId]) -> Result<()>;
    /// Make the tab the active one in its window.
    async fn activate(&self, tab_id: HostTabId) -> Result<()>;
    async fn focus_window(&self, window_id: WindowId) -> Result<()>;
}

/// Host with no browser attached: the inventory is empty and every
/// operation that would touch a real tab fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedTabHost;

fn detached() -> Error {
    Error::External("no browser attached".to_string())
}

#[async_trait]
impl TabHost for DetachedTabHost {
    async fn current_window(&self) -> Result<WindowId> {
        Err(Error::NotFound("no focused window".to_string()))
    }

    async fn query(&self, _query: TabQuery) -> Result<Vec<HostTab>> {
        Ok(Vec::new())
    }

    async fn get(&self, tab_id: HostTabId) -> Result<HostTab> {
        Err(Error::NotFound(format!("tab {}", tab_id)))
    }

    async fn create(&self, _props: CreateTab) -> Result<HostTab> {
        Err(detached())
    }

    async fn remove(&self, _tab_ids: &[HostTabId]) -> Result<()> {
        Err(detached())
    }

    async fn activate(&self, _tab_id: HostTabId) -> Result<()> {
        Err(detached())
    }

    async fn focus_window(&self, _window_id: WindowId) -> Result<()> {
        Err(detached())
    }
}
