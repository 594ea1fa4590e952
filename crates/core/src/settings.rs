use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Open the panel as a browser side panel.
    #[default]
    Side,
    /// Open the panel in a regular tab.
    Tab,
}

/// The flat `settings` record. Unrecognized keys are carried in `extra`
/// and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, deserialize_with = "lenient")]
    pub theme: Theme,
    #[serde(default, deserialize_with = "lenient")]
    pub view_mode: ViewMode,
    #[serde(default, deserialize_with = "lenient")]
    pub show_browsing_tabs: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Falls back to the field default when a stored value has the wrong shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value.clone()).unwrap_or_else(|e| {
        warn!(error = %e, value = %value, "Ignoring invalid stored value");
        T::default()
    }))
}

impl Settings {
    /// Stored settings overlaid on the defaults. `None` or a non-object
    /// value yields the defaults.
    pub fn from_stored(stored: Option<&Value>) -> Self {
        match stored {
            Some(Value::Object(map)) => Self::default().merge_patch(map),
            Some(other) => {
                warn!(value = %other, "Stored settings are not an object, using defaults");
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Shallow merge of `patch` over these settings.
    pub fn merge_patch(&self, patch: &Map<String, Value>) -> Self {
        let mut merged = self.to_map();
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(merged)).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to merge settings patch, keeping previous settings");
            self.clone()
        })
    }

    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_stored(None);
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.view_mode, ViewMode::Side);
        assert!(!settings.show_browsing_tabs);
    }

    #[test]
    fn test_missing_keys_fall_back() {
        let stored = json!({"viewMode": "tab"});
        let settings = Settings::from_stored(Some(&stored));
        assert_eq!(settings.view_mode, ViewMode::Tab);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let stored = json!({"theme": "light", "fontScale": 1.25});
        let settings = Settings::from_stored(Some(&stored));
        assert_eq!(settings.theme, Theme::Light);
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["fontScale"], 1.25);
        assert_eq!(value["showBrowsingTabs"], false);
    }

    #[test]
    fn test_invalid_value_uses_default() {
        let stored = json!({"theme": "neon", "showBrowsingTabs": "yes"});
        let settings = Settings::from_stored(Some(&stored));
        assert_eq!(settings.theme, Theme::Dark);
        assert!(!settings.show_browsing_tabs);
    }

    #[test]
    fn test_merge_patch() {
        let base = Settings::default();
        let patch = json!({"showBrowsingTabs": true, "theme": "system"});
        let merged = base.merge_patch(patch.as_object().unwrap());
        assert!(merged.show_browsing_tabs);
        assert_eq!(merged.theme, Theme::System);
        assert_eq!(merged.view_mode, ViewMode::Side);
    }
}
