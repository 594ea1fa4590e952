pub mod blob;
pub mod store;

pub use blob::{BlobStore, JsonFileBlobStore, MemoryBlobStore, Record, StorageChange};
pub use store::{is_settings_change, ShelfStore, StoredState, GROUPS_KEY, SETTINGS_KEY};
