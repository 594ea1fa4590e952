use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;

use crate::error::{Error, Result};
use crate::ids::IdGenerator;
use crate::paths::Paths;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Blob file; `None` means `<base>/store.json`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionConfig {
    /// URL of the panel page when opened as a tab.
    #[serde(default = "default_panel_url")]
    pub panel_url: String,
    /// URL prefix of the extension's own pages. Derived from `panel_url`
    /// when unset.
    #[serde(default)]
    pub origin: Option<String>,
}

fn default_panel_url() -> String {
    "chrome-extension://tabshelf/panel.html".to_string()
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            panel_url: default_panel_url(),
            origin: None,
        }
    }
}

impl ExtensionConfig {
    /// `scheme://host[:port]/` of the extension's own pages, taken from
    /// `origin` when set and from `panel_url` otherwise. Unparseable input
    /// is returned trimmed as-is.
    pub fn ui_origin(&self) -> String {
        let source = match self.origin.as_deref().map(str::trim) {
            Some(origin) if !origin.is_empty() => origin,
            _ => self.panel_url.trim(),
        };
        match Url::parse(source) {
            Ok(url) => match url.host_str() {
                Some(host) => {
                    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
                    format!("{}://{}{}/", url.scheme(), host, port)
                }
                None => source.to_string(),
            },
            Err(e) => {
                warn!(error = %e, url = source, "Extension URL does not parse");
                source.to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub extension: ExtensionConfig,
    #[serde(default)]
    pub id_style: IdGenerator,
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

fn default_bus_capacity() -> usize {
    64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            extension: ExtensionConfig::default(),
            id_style: IdGenerator::default(),
            bus_capacity: default_bus_capacity(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn store_path(&self, paths: &Paths) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| paths.store_file())
    }
}
