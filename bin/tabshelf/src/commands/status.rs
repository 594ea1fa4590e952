use std::path::Path;
use tabshelf_core::GroupKind;
use tabshelf_service::reconcile;

use super::Context;

pub async fn run(config_override: Option<&Path>) -> anyhow::Result<()> {
    let ctx = Context::load(config_override)?;

    println!("tabshelf status");
    println!("===============");
    println!();

    let config_exists = ctx.config_path.exists();
    println!(
        "Config:  {} {}",
        ctx.config_path.display(),
        if config_exists { "✓" } else { "✗ (defaults)" }
    );

    let store_path = ctx.store_path();
    let store_exists = store_path.exists();
    println!(
        "Store:   {} {}",
        store_path.display(),
        if store_exists { "✓" } else { "✗ (empty)" }
    );
    println!("Panel:   {}", ctx.config.extension.panel_url);
    println!();

    let state = ctx.open_store().await?.load().await?;
    let groups = reconcile(state.groups);
    let user_groups = groups.iter().filter(|g| g.kind == GroupKind::User).count();
    let tabs: usize = groups.iter().map(|g| g.tabs.len()).sum();

    println!("Groups:  {} ({} user)", groups.len(), user_groups);
    println!("Tabs:    {}", tabs);
    println!();
    println!("Settings:");
    println!("  theme             {:?}", state.settings.theme);
    println!("  viewMode          {:?}", state.settings.view_mode);
    println!("  showBrowsingTabs  {}", state.settings.show_browsing_tabs);

    Ok(())
}
