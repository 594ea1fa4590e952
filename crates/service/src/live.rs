//! Snapshot of currently open tabs, rendered as a synthetic group.

use tabshelf_core::{Group, Result, Tab};
use tracing::debug;
use url::Url;

use crate::host::{HostTab, TabHost, TabQuery, WindowId};

/// URL schemes of browser-internal pages that are never mirrored.
const INTERNAL_SCHEMES: &[&str] = &[
    "chrome",
    "chrome-extension",
    "edge",
    "about",
    "devtools",
    "view-source",
];

/// `true` for tabs that may appear in the live group. URLs that do not
/// parse are skipped.
pub fn is_mirrorable(url: &str, ui_origin: &str) -> bool {
    let Ok(url) = Url::parse(url) else {
        return false;
    };
    if INTERNAL_SCHEMES.contains(&url.scheme()) {
        return false;
    }
    match Url::parse(ui_origin) {
        Ok(origin) => !same_origin(&url, &origin),
        Err(_) => true,
    }
}

fn same_origin(a: &Url, b: &Url) -> bool {
    let host_matches = match (a.host_str(), b.host_str()) {
        (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
        _ => false,
    };
    a.scheme() == b.scheme()
        && host_matches
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Build the live browsing group for `window_id`, or for the focused window
/// when none is given. If the focused window cannot be resolved the query
/// spans all windows.
pub async fn snapshot(
    host: &dyn TabHost,
    ui_origin: &str,
    window_id: Option<WindowId>,
) -> Result<Group> {
    let window_id = match window_id {
        Some(id) => Some(id),
        None => match host.current_window().await {
            Ok(id) => Some(id),
            Err(e) => {
                debug!(error = %e, "No focused window, mirroring tabs from all windows");
                None
            }
        },
    };

    let query = TabQuery {
        window_id,
        ..TabQuery::default()
    };
    let tabs: Vec<Tab> = host
        .query(query)
        .await?
        .iter()
        .filter_map(|tab| to_pseudo_tab(tab, ui_origin))
        .collect();

    Ok(Group::live(tabs))
}

fn to_pseudo_tab(tab: &HostTab, ui_origin: &str) -> Option<Tab> {
    let url = tab.url.as_deref()?;
    if !is_mirrorable(url, ui_origin) {
        return None;
    }
    Some(Tab::live(
        tab.id,
        url,
        tab.title.as_deref().unwrap_or_default(),
        tab.fav_icon_url.as_deref().unwrap_or_default(),
    ))
}
