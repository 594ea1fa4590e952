//! One command object per request type, each a thin adapter from a parsed
//! `Request` onto a `Shelf` handler.

use async_trait::async_trait;
use serde_json::Value;
use tabshelf_core::{Error, Request, Result};

use crate::reorder::Move;
use crate::shelf::Shelf;

#[async_trait]
pub trait Command: Send + Sync {
    /// The request `type` this command answers to.
    fn name(&self) -> &'static str;
    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value>;
}

fn mismatch(expected: &str, request: &Request) -> Error {
    Error::Validation(format!(
        "{} command received a {} request",
        expected,
        request.name()
    ))
}

fn done() -> Value {
    Value::Bool(true)
}

pub struct CaptureWindowCommand;

#[async_trait]
impl Command for CaptureWindowCommand {
    fn name(&self) -> &'static str {
        "captureWindow"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::CaptureWindow => Ok(serde_json::to_value(shelf.capture_window().await?)?),
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct QuickCaptureCommand;

#[async_trait]
impl Command for QuickCaptureCommand {
    fn name(&self) -> &'static str {
        "quickCapture"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::QuickCapture => Ok(serde_json::to_value(shelf.capture_active_tab().await?)?),
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct GetDataCommand;

#[async_trait]
impl Command for GetDataCommand {
    fn name(&self) -> &'static str {
        "getData"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::GetData { window_id } => {
                Ok(serde_json::to_value(shelf.get_data(window_id).await?)?)
            }
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct SetSettingsCommand;

#[async_trait]
impl Command for SetSettingsCommand {
    fn name(&self) -> &'static str {
        "setSettings"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::SetSettings { settings } => {
                Ok(serde_json::to_value(shelf.set_settings(&settings).await?)?)
            }
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct AddGroupCommand;

#[async_trait]
impl Command for AddGroupCommand {
    fn name(&self) -> &'static str {
        "addGroup"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::AddGroup { name } => {
                Ok(serde_json::to_value(shelf.add_group(name.as_deref()).await?)?)
            }
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct RenameGroupCommand;

#[async_trait]
impl Command for RenameGroupCommand {
    fn name(&self) -> &'static str {
        "renameGroup"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::RenameGroup { group_id, name } => {
                Ok(serde_json::to_value(shelf.rename_group(&group_id, &name).await?)?)
            }
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct RenameTabCommand;

#[async_trait]
impl Command for RenameTabCommand {
    fn name(&self) -> &'static str {
        "renameTab"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::RenameTab {
                group_id,
                tab_id,
                title,
            } => Ok(serde_json::to_value(
                shelf.rename_tab(&group_id, &tab_id, &title).await?,
            )?),
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct RemoveTabCommand;

#[async_trait]
impl Command for RemoveTabCommand {
    fn name(&self) -> &'static str {
        "removeTab"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::RemoveTab { group_id, tab_id } => {
                shelf.remove_tab(&group_id, &tab_id).await?;
                Ok(done())
            }
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct ClearGroupCommand;

#[async_trait]
impl Command for ClearGroupCommand {
    fn name(&self) -> &'static str {
        "clearGroup"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::ClearGroup { group_id } => {
                shelf.clear_group(&group_id).await?;
                Ok(done())
            }
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct RemoveGroupCommand;

#[async_trait]
impl Command for RemoveGroupCommand {
    fn name(&self) -> &'static str {
        "removeGroup"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::RemoveGroup { group_id } => {
                shelf.remove_group(&group_id).await?;
                Ok(done())
            }
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct RestoreTabCommand;

#[async_trait]
impl Command for RestoreTabCommand {
    fn name(&self) -> &'static str {
        "restoreTab"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::RestoreTab {
                group_id,
                tab_id,
                active,
            } => {
                shelf.restore_tab(&group_id, &tab_id, active).await?;
                Ok(done())
            }
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct RestoreGroupCommand;

#[async_trait]
impl Command for RestoreGroupCommand {
    fn name(&self) -> &'static str {
        "restoreGroup"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::RestoreGroup { group_id } => {
                shelf.restore_group(&group_id).await?;
                Ok(done())
            }
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct MoveTabCommand;

#[async_trait]
impl Command for MoveTabCommand {
    fn name(&self) -> &'static str {
        "moveTab"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::MoveTab {
                from_group_id,
                to_group_id,
                tab_id,
                target_tab_id,
                insert_after,
            } => {
                shelf
                    .move_tab(&Move {
                        from_group_id: &from_group_id,
                        to_group_id: &to_group_id,
                        tab_id: &tab_id,
                        target_tab_id: target_tab_id.as_deref(),
                        insert_after,
                    })
                    .await?;
                Ok(done())
            }
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct GetUserGroupsCommand;

#[async_trait]
impl Command for GetUserGroupsCommand {
    fn name(&self) -> &'static str {
        "getUserGroups"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::GetUserGroups => Ok(serde_json::to_value(shelf.user_groups().await?)?),
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct SetGroupPersistentCommand;

#[async_trait]
impl Command for SetGroupPersistentCommand {
    fn name(&self) -> &'static str {
        "setGroupPersistent"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::SetGroupPersistent {
                group_id,
                persistent,
            } => Ok(serde_json::to_value(
                shelf.set_group_persistent(&group_id, persistent).await?,
            )?),
            other => Err(mismatch(self.name(), &other)),
        }
    }
}

pub struct CloseLiveTabCommand;

#[async_trait]
impl Command for CloseLiveTabCommand {
    fn name(&self) -> &'static str {
        "closeLiveTab"
    }

    async fn execute(&self, shelf: &Shelf, request: Request) -> Result<Value> {
        match request {
            Request::CloseLiveTab { tab_id } => {
                shelf.close_live_tab(tab_id).await?;
                Ok(done())
            }
            other => Err(mismatch(self.name(), &other)),
        }
    }
}
