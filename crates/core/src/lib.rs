pub mod config;
pub mod error;
pub mod ids;
pub mod message;
pub mod paths;
pub mod settings;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use ids::IdGenerator;
pub use message::{Broadcast, Request, Response};
pub use paths::Paths;
pub use settings::{Settings, Theme, ViewMode};
pub use types::{Group, GroupKind, Tab, UserGroupSummary};
