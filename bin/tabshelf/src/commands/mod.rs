pub mod groups;
pub mod request;
pub mod serve;
pub mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabshelf_core::{Config, Paths};
use tabshelf_service::{DetachedTabHost, HeadlessUi, ShelfRuntime};
use tabshelf_storage::{JsonFileBlobStore, ShelfStore};

/// Resolved config plus where it came from.
pub struct Context {
    pub paths: Paths,
    pub config_path: PathBuf,
    pub config: Config,
}

impl Context {
    pub fn load(config_override: Option<&Path>) -> anyhow::Result<Self> {
        let paths = Paths::new();
        let (config_path, config) = match config_override {
            Some(path) => (path.to_path_buf(), Config::load(path)?),
            None => (paths.config_file(), Config::load_or_default(&paths)?),
        };
        Ok(Self {
            paths,
            config_path,
            config,
        })
    }

    pub fn store_path(&self) -> PathBuf {
        self.config.store_path(&self.paths)
    }

    pub async fn open_store(&self) -> anyhow::Result<ShelfStore> {
        let blob = JsonFileBlobStore::open(self.store_path()).await?;
        Ok(ShelfStore::new(Arc::new(blob)))
    }

    /// Full runtime over the on-disk store. No browser is attached, so tab
    /// inventory is empty and host-side operations fail.
    pub async fn start_runtime(&self) -> anyhow::Result<ShelfRuntime> {
        let blob = JsonFileBlobStore::open(self.store_path()).await?;
        let runtime = ShelfRuntime::start(
            &self.config,
            Arc::new(blob),
            Arc::new(DetachedTabHost),
            Arc::new(HeadlessUi),
        )
        .await?;
        Ok(runtime)
    }
}
