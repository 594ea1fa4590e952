use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tabshelf_core::{Request, Response};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::bus::InboundMessage;
use crate::commands::*;
use crate::shelf::Shelf;

#[derive(Clone)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // Capture
        registry.register(Arc::new(CaptureWindowCommand));
        registry.register(Arc::new(QuickCaptureCommand));

        // Reads
        registry.register(Arc::new(GetDataCommand));
        registry.register(Arc::new(GetUserGroupsCommand));

        // Settings
        registry.register(Arc::new(SetSettingsCommand));

        // Group edits
        registry.register(Arc::new(AddGroupCommand));
        registry.register(Arc::new(RenameGroupCommand));
        registry.register(Arc::new(ClearGroupCommand));
        registry.register(Arc::new(RemoveGroupCommand));
        registry.register(Arc::new(SetGroupPersistentCommand));

        // Tab edits
        registry.register(Arc::new(RenameTabCommand));
        registry.register(Arc::new(RemoveTabCommand));
        registry.register(Arc::new(MoveTabCommand));

        // Restore
        registry.register(Arc::new(RestoreTabCommand));
        registry.register(Arc::new(RestoreGroupCommand));

        // Live tabs
        registry.register(Arc::new(CloseLiveTabCommand));

        registry
    }

    pub fn register(&mut self, command: Arc<dyn Command>) {
        debug!(name = command.name(), "Registering command");
        self.commands.insert(command.name().to_string(), command);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Routes messages to commands and wraps every outcome in a `Response`.
#[derive(Clone)]
pub struct Dispatcher {
    shelf: Shelf,
    registry: Arc<CommandRegistry>,
}

impl Dispatcher {
    pub fn new(shelf: Shelf) -> Self {
        Self::with_registry(shelf, CommandRegistry::with_defaults())
    }

    pub fn with_registry(shelf: Shelf, registry: CommandRegistry) -> Self {
        Self {
            shelf,
            registry: Arc::new(registry),
        }
    }

    pub fn shelf(&self) -> &Shelf {
        &self.shelf
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Handle a raw message. Messages without a known `type` get no reply.
    pub async fn dispatch(&self, message: &Value) -> Option<Response> {
        let Some(name) = message.get("type").and_then(Value::as_str) else {
            debug!("Ignoring message without a type");
            return None;
        };
        let Some(command) = self.registry.get(name) else {
            debug!(name, "Ignoring unknown command");
            return None;
        };
        let request = match serde_json::from_value::<Request>(message.clone()) {
            Ok(request) => request,
            Err(e) => {
                warn!(name, error = %e, "Malformed request");
                return Some(Response::failure(format!("Invalid {} request: {}", name, e)));
            }
        };
        Some(self.invoke(command, request).await)
    }

    /// Run an already-typed request through the same path as raw messages.
    pub async fn send(&self, request: Request) -> Response {
        let name = request.name();
        match self.registry.get(name) {
            Some(command) => self.invoke(command, request).await,
            None => Response::failure(format!("Unknown command: {}", name)),
        }
    }

    async fn invoke(&self, command: &Arc<dyn Command>, request: Request) -> Response {
        debug!(name = command.name(), "Dispatching");
        match command.execute(&self.shelf, request).await {
            Ok(result) => Response::success(result),
            Err(e) => {
                warn!(name = command.name(), error = %e, "Command failed");
                Response::failure(e.to_string())
            }
        }
    }

    /// Serve inbound messages until every sender is gone. Each message runs
    /// on its own task, so handlers interleave at their await points.
    pub async fn run(self, mut inbound: mpsc::Receiver<InboundMessage>) {
        while let Some(message) = inbound.recv().await {
            let dispatcher = self.clone();
            tokio::spawn(async move {
                let response = dispatcher.dispatch(&message.payload).await;
                if let (Some(response), Some(reply)) = (response, message.reply) {
                    if reply.send(response).is_err() {
                        debug!("Requester went away before the reply");
                    }
                }
            });
        }
        debug!("Inbound channel closed, dispatcher stopping");
    }
}
