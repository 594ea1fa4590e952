use serde::{Deserialize, Serialize};

use crate::settings::lenient;

pub const PINNED_GROUP_ID: &str = "pinned-default";
pub const QUICK_GROUP_ID: &str = "quick-default";
pub const BROWSING_GROUP_ID: &str = "browsing-live";

pub const PINNED_GROUP_NAME: &str = "Pinned Tabs";
pub const QUICK_GROUP_NAME: &str = "Quick Captures";
pub const BROWSING_GROUP_NAME: &str = "Browsing Now";
pub const DEFAULT_USER_GROUP_NAME: &str = "New Group";

/// Prefix of pseudo-tab ids in the live browsing group.
const LIVE_TAB_PREFIX: &str = "live-";

/// Which of the four group variants a group is.
///
/// System groups (`Pinned`, `QuickCapture`) always exist and carry fixed
/// names and persistence flags. `LiveBrowsing` is synthesized on read and
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Pinned,
    QuickCapture,
    User,
    LiveBrowsing,
}

impl GroupKind {
    /// Classify a group by its id.
    pub fn of(id: &str) -> Self {
        match id {
            PINNED_GROUP_ID => GroupKind::Pinned,
            QUICK_GROUP_ID => GroupKind::QuickCapture,
            BROWSING_GROUP_ID => GroupKind::LiveBrowsing,
            _ => GroupKind::User,
        }
    }

    pub fn is_system(self) -> bool {
        matches!(self, GroupKind::Pinned | GroupKind::QuickCapture)
    }

    pub fn is_live(self) -> bool {
        self == GroupKind::LiveBrowsing
    }
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKind::Pinned => write!(f, "pinned"),
            GroupKind::QuickCapture => write!(f, "quick-capture"),
            GroupKind::User => write!(f, "user"),
            GroupKind::LiveBrowsing => write!(f, "browsing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub url: String,
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    /// Display override; empty means "use `title`".
    #[serde(default, deserialize_with = "lenient")]
    pub custom_title: String,
    #[serde(default, deserialize_with = "lenient")]
    pub fav_icon_url: String,
    /// Host tab id, only set on live browsing pseudo-tabs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_tab_id: Option<i64>,
}

impl Tab {
    pub fn new(id: String, url: &str, title: &str, fav_icon_url: &str) -> Self {
        Self {
            id,
            url: url.to_string(),
            title: title.to_string(),
            custom_title: String::new(),
            fav_icon_url: fav_icon_url.to_string(),
            live_tab_id: None,
        }
    }

    /// Pseudo-tab mirroring an open host tab.
    pub fn live(host_tab_id: i64, url: &str, title: &str, fav_icon_url: &str) -> Self {
        let display = if title.is_empty() { url } else { title };
        Self {
            id: format!("{}{}", LIVE_TAB_PREFIX, host_tab_id),
            url: url.to_string(),
            title: title.to_string(),
            custom_title: display.to_string(),
            fav_icon_url: fav_icon_url.to_string(),
            live_tab_id: Some(host_tab_id),
        }
    }

    /// Recover the host tab id from a live pseudo-tab id.
    pub fn parse_live_id(tab_id: &str) -> Option<i64> {
        tab_id.strip_prefix(LIVE_TAB_PREFIX)?.parse().ok()
    }

    pub fn display_title(&self) -> &str {
        if !self.custom_title.is_empty() {
            &self.custom_title
        } else if !self.title.is_empty() {
            &self.title
        } else {
            &self.url
        }
    }
}

/// Wire/storage shape of a group. `kind` is derived from `id` and the
/// optional `type` marker when a record crosses the serde boundary.
/// Scalar fields of the wrong type fall back to their defaults so drifted
/// records still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupRecord {
    id: String,
    #[serde(default, deserialize_with = "lenient")]
    name: String,
    #[serde(default, deserialize_with = "lenient")]
    created_at: i64,
    #[serde(default, deserialize_with = "lenient")]
    persistent: bool,
    #[serde(default)]
    tabs: Vec<Tab>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GroupRecord", into = "GroupRecord")]
pub struct Group {
    pub id: String,
    pub kind: GroupKind,
    pub name: String,
    pub created_at: i64,
    pub persistent: bool,
    pub tabs: Vec<Tab>,
}

impl From<GroupRecord> for Group {
    fn from(record: GroupRecord) -> Self {
        let kind = match record.marker.as_deref() {
            Some("browsing") => GroupKind::LiveBrowsing,
            _ => GroupKind::of(&record.id),
        };
        Self {
            id: record.id,
            kind,
            name: record.name,
            created_at: record.created_at,
            persistent: record.persistent,
            tabs: record.tabs,
        }
    }
}

impl From<Group> for GroupRecord {
    fn from(group: Group) -> Self {
        let marker = match group.kind {
            GroupKind::LiveBrowsing => Some("browsing".to_string()),
            GroupKind::Pinned | GroupKind::QuickCapture | GroupKind::User => None,
        };
        Self {
            id: group.id,
            name: group.name,
            created_at: group.created_at,
            persistent: group.persistent,
            tabs: group.tabs,
            marker,
        }
    }
}

impl Group {
    pub fn pinned() -> Self {
        Self {
            id: PINNED_GROUP_ID.to_string(),
            kind: GroupKind::Pinned,
            name: PINNED_GROUP_NAME.to_string(),
            created_at: 0,
            persistent: true,
            tabs: Vec::new(),
        }
    }

    pub fn quick_capture() -> Self {
        Self {
            id: QUICK_GROUP_ID.to_string(),
            kind: GroupKind::QuickCapture,
            name: QUICK_GROUP_NAME.to_string(),
            created_at: 0,
            persistent: false,
            tabs: Vec::new(),
        }
    }

    /// User groups start out non-persistent.
    pub fn user(id: String, name: &str, created_at: i64) -> Self {
        Self {
            id,
            kind: GroupKind::User,
            name: name.to_string(),
            created_at,
            persistent: false,
            tabs: Vec::new(),
        }
    }

    /// `persistent` is set only so collaborators hide delete affordances.
    pub fn live(tabs: Vec<Tab>) -> Self {
        Self {
            id: BROWSING_GROUP_ID.to_string(),
            kind: GroupKind::LiveBrowsing,
            name: BROWSING_GROUP_NAME.to_string(),
            created_at: 0,
            persistent: true,
            tabs,
        }
    }

    /// Force the canonical name and persistence flag onto system groups.
    pub fn normalize(&mut self) {
        match self.kind {
            GroupKind::Pinned => {
                self.name = PINNED_GROUP_NAME.to_string();
                self.persistent = true;
            }
            GroupKind::QuickCapture => {
                self.name = QUICK_GROUP_NAME.to_string();
                self.persistent = false;
            }
            GroupKind::User | GroupKind::LiveBrowsing => {}
        }
    }

    pub fn tab_index(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }

    pub fn tab_mut(&mut self, tab_id: &str) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == tab_id)
    }
}

/// Projection of a user group for the settings surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGroupSummary {
    pub id: String,
    pub name: String,
    pub persistent: bool,
}

impl From<&Group> for UserGroupSummary {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            persistent: group.persistent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_derived_from_reserved_ids() {
        assert_eq!(GroupKind::of(PINNED_GROUP_ID), GroupKind::Pinned);
        assert_eq!(GroupKind::of(QUICK_GROUP_ID), GroupKind::QuickCapture);
        assert_eq!(GroupKind::of(BROWSING_GROUP_ID), GroupKind::LiveBrowsing);
        assert_eq!(GroupKind::of("3f1c"), GroupKind::User);
        assert!(GroupKind::Pinned.is_system());
        assert!(!GroupKind::LiveBrowsing.is_system());
    }

    #[test]
    fn test_drifted_group_fields_fall_back_to_defaults() {
        let group: Group = serde_json::from_value(json!({
            "id": "g2",
            "name": 7,
            "createdAt": "yesterday",
            "persistent": "yes",
            "tabs": [{"id": "t", "url": "https://x", "title": null, "favIconUrl": 3}]
        }))
        .unwrap();
        assert_eq!(group.id, "g2");
        assert_eq!(group.name, "");
        assert_eq!(group.created_at, 0);
        assert!(!group.persistent);
        assert_eq!(group.tabs.len(), 1);
        assert_eq!(group.tabs[0].url, "https://x");
        assert_eq!(group.tabs[0].title, "");
        assert_eq!(group.tabs[0].fav_icon_url, "");
    }

    #[test]
    fn test_group_deserializes_legacy_record() {
        let raw = json!({
            "id": "pinned-default",
            "name": "old name",
            "createdAt": 0,
            "tabs": [{"id": "t1", "url": "https://example.com", "title": "Example"}]
        });
        let group: Group = serde_json::from_value(raw).unwrap();
        assert_eq!(group.kind, GroupKind::Pinned);
        assert!(!group.persistent);
        assert_eq!(group.tabs[0].custom_title, "");
        assert_eq!(group.tabs[0].fav_icon_url, "");
    }

    #[test]
    fn test_live_group_carries_type_marker() {
        let group = Group::live(vec![Tab::live(42, "https://a.test", "", "")]);
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["type"], "browsing");
        assert_eq!(value["persistent"], true);
        assert_eq!(value["tabs"][0]["liveTabId"], 42);
        assert_eq!(value["tabs"][0]["customTitle"], "https://a.test");

        let back: Group = serde_json::from_value(value).unwrap();
        assert_eq!(back.kind, GroupKind::LiveBrowsing);
    }

    #[test]
    fn test_user_group_omits_marker() {
        let group = Group::user("g1".into(), "Reading", 5);
        let value = serde_json::to_value(&group).unwrap();
        assert!(value.get("type").is_none());
        assert!(value.get("kind").is_none());
        assert_eq!(value["createdAt"], 5);
    }

    #[test]
    fn test_normalize_system_groups() {
        let mut quick = Group::quick_capture();
        quick.name = "renamed".into();
        quick.persistent = true;
        quick.normalize();
        assert_eq!(quick.name, QUICK_GROUP_NAME);
        assert!(!quick.persistent);

        let mut user = Group::user("u".into(), "Mine", 1);
        user.persistent = true;
        user.normalize();
        assert_eq!(user.name, "Mine");
        assert!(user.persistent);
    }

    #[test]
    fn test_live_tab_id_round_trip() {
        let tab = Tab::live(7, "https://x.test", "X", "");
        assert_eq!(Tab::parse_live_id(&tab.id), Some(7));
        assert_eq!(Tab::parse_live_id("tab-7"), None);
        assert_eq!(Tab::parse_live_id("live-abc"), None);
    }

    #[test]
    fn test_display_title_prefers_custom() {
        let mut tab = Tab::new("t".into(), "https://x.test", "X", "");
        assert_eq!(tab.display_title(), "X");
        tab.custom_title = "Mine".into();
        assert_eq!(tab.display_title(), "Mine");
    }
}
