use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::settings::Settings;

/// Inbound request: `{ "type": "<command>", ...fields }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    CaptureWindow,
    /// Shelve the focused window's active tab into the quick-capture group.
    QuickCapture,
    #[serde(rename_all = "camelCase")]
    GetData {
        #[serde(default)]
        window_id: Option<i64>,
    },
    SetSettings {
        #[serde(default)]
        settings: Map<String, Value>,
    },
    AddGroup {
        #[serde(default)]
        name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    RenameGroup {
        group_id: String,
        #[serde(default)]
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    RenameTab {
        group_id: String,
        tab_id: String,
        #[serde(default)]
        title: String,
    },
    #[serde(rename_all = "camelCase")]
    RemoveTab { group_id: String, tab_id: String },
    #[serde(rename_all = "camelCase")]
    ClearGroup { group_id: String },
    #[serde(rename_all = "camelCase")]
    RemoveGroup { group_id: String },
    #[serde(rename_all = "camelCase")]
    RestoreTab {
        group_id: String,
        tab_id: String,
        #[serde(default)]
        active: bool,
    },
    #[serde(rename_all = "camelCase")]
    RestoreGroup { group_id: String },
    #[serde(rename_all = "camelCase")]
    MoveTab {
        from_group_id: String,
        to_group_id: String,
        tab_id: String,
        #[serde(default)]
        target_tab_id: Option<String>,
        #[serde(default)]
        insert_after: bool,
    },
    GetUserGroups,
    #[serde(rename_all = "camelCase")]
    SetGroupPersistent { group_id: String, persistent: bool },
    #[serde(rename_all = "camelCase")]
    CloseLiveTab { tab_id: i64 },
}

impl Request {
    /// The `type` tag this request serializes with.
    pub fn name(&self) -> &'static str {
        match self {
            Request::CaptureWindow => "captureWindow",
            Request::QuickCapture => "quickCapture",
            Request::GetData { .. } => "getData",
            Request::SetSettings { .. } => "setSettings",
            Request::AddGroup { .. } => "addGroup",
            Request::RenameGroup { .. } => "renameGroup",
            Request::RenameTab { .. } => "renameTab",
            Request::RemoveTab { .. } => "removeTab",
            Request::ClearGroup { .. } => "clearGroup",
            Request::RemoveGroup { .. } => "removeGroup",
            Request::RestoreTab { .. } => "restoreTab",
            Request::RestoreGroup { .. } => "restoreGroup",
            Request::MoveTab { .. } => "moveTab",
            Request::GetUserGroups => "getUserGroups",
            Request::SetGroupPersistent { .. } => "setGroupPersistent",
            Request::CloseLiveTab { .. } => "closeLiveTab",
        }
    }
}

pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Uniform reply envelope: `{ok: true, result}` or `{ok: false, message}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        };
        Self {
            ok: false,
            result: None,
            message: Some(message),
        }
    }
}

/// Fire-and-forget notifications to whatever UI is listening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Broadcast {
    ReloadData,
    SettingsChanged { settings: Settings },
}
