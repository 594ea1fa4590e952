//! Drag-reorder of shelved tabs, within a group or across groups.

use tabshelf_core::{Error, Group, Result, Tab};

/// Where a dragged tab should land.
#[derive(Debug, Clone, Copy)]
pub struct Move<'a> {
    pub from_group_id: &'a str,
    pub to_group_id: &'a str,
    pub tab_id: &'a str,
    /// Neighbour to drop next to; `None` appends.
    pub target_tab_id: Option<&'a str>,
    pub insert_after: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Dropped onto itself; nothing to write.
    Unchanged,
}

/// Insertion index in `tabs` next to `target`, or the end when the target is
/// absent or unknown.
fn drop_index(tabs: &[Tab], target: Option<&str>, insert_after: bool) -> usize {
    target
        .and_then(|id| tabs.iter().position(|t| t.id == id))
        .map(|index| index + usize::from(insert_after))
        .unwrap_or(tabs.len())
}

fn group_index(groups: &[Group], id: &str) -> Result<usize> {
    groups
        .iter()
        .position(|g| g.id == id)
        .ok_or_else(|| Error::NotFound(format!("group {}", id)))
}

/// Apply `mv` to `groups` in place.
pub fn apply(groups: &mut [Group], mv: &Move<'_>) -> Result<MoveOutcome> {
    let from = group_index(groups, mv.from_group_id)?;
    let to = group_index(groups, mv.to_group_id)?;

    if from == to && mv.target_tab_id == Some(mv.tab_id) {
        return Ok(MoveOutcome::Unchanged);
    }

    let source = groups[from]
        .tab_index(mv.tab_id)
        .ok_or_else(|| Error::NotFound(format!("tab {}", mv.tab_id)))?;

    if from == to {
        let tabs = &mut groups[from].tabs;
        // Destination is measured before removal, then shifted left when the
        // removed tab sat in front of it.
        let mut dest = drop_index(tabs, mv.target_tab_id, mv.insert_after);
        let tab = tabs.remove(source);
        if source < dest {
            dest -= 1;
        }
        let dest = dest.min(tabs.len());
        tabs.insert(dest, tab);
    } else {
        let tab = groups[from].tabs.remove(source);
        let tabs = &mut groups[to].tabs;
        let dest = drop_index(tabs, mv.target_tab_id, mv.insert_after).min(tabs.len());
        tabs.insert(dest, tab);
    }

    Ok(MoveOutcome::Moved)
}
