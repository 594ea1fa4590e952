//! Canonical ordering of the stored group list.

use tabshelf_core::{Group, GroupKind};
use tracing::debug;

/// Turn a raw stored list into `[pinned, ...user groups, quick-capture]`.
///
/// Missing system groups are synthesized, present ones keep their tabs but
/// get their name and persistence flag reset. Duplicate system groups and
/// any stored live browsing group are dropped. User groups keep their stored
/// relative order.
pub fn reconcile(stored: Vec<Group>) -> Vec<Group> {
    let mut pinned: Option<Group> = None;
    let mut quick: Option<Group> = None;
    let mut users = Vec::with_capacity(stored.len());

    for group in stored {
        match group.kind {
            GroupKind::Pinned => {
                if pinned.is_none() {
                    pinned = Some(group);
                } else {
                    debug!(id = %group.id, "Dropping duplicate pinned group");
                }
            }
            GroupKind::QuickCapture => {
                if quick.is_none() {
                    quick = Some(group);
                } else {
                    debug!(id = %group.id, "Dropping duplicate quick-capture group");
                }
            }
            GroupKind::LiveBrowsing => {
                debug!("Dropping stale live browsing group from stored list");
            }
            GroupKind::User => users.push(group),
        }
    }

    let mut pinned = pinned.unwrap_or_else(Group::pinned);
    let mut quick = quick.unwrap_or_else(Group::quick_capture);
    pinned.normalize();
    quick.normalize();

    let mut groups = Vec::with_capacity(users.len() + 2);
    groups.push(pinned);
    groups.extend(users);
    groups.push(quick);
    groups
}
