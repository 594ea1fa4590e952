pub mod bus;
pub mod commands;
pub mod dispatcher;
pub mod host;
pub mod live;
pub mod reconcile;
pub mod reorder;
pub mod runtime;
pub mod settings_cache;
pub mod shelf;
pub mod triggers;

#[cfg(test)]
mod testing;

pub use bus::{BusClient, InboundMessage, MessageBus};
pub use commands::Command;
pub use dispatcher::{CommandRegistry, Dispatcher};
pub use host::{CreateTab, DetachedTabHost, HostTab, HostTabId, TabHost, TabQuery, WindowId};
pub use reconcile::reconcile;
pub use reorder::{Move, MoveOutcome};
pub use runtime::ShelfRuntime;
pub use settings_cache::SettingsCache;
pub use shelf::{Shelf, ShelfState};
pub use triggers::{HeadlessUi, TriggerEvent, Triggers, UiSurface, QUICK_CAPTURE_COMMAND};
