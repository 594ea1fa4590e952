use std::path::Path;
use tabshelf_service::reconcile;

use super::Context;

pub async fn run(config_override: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let ctx = Context::load(config_override)?;
    let groups = reconcile(ctx.open_store().await?.read_groups().await?);

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    for group in &groups {
        let flag = if group.persistent { "persistent" } else { "" };
        println!(
            "{:<38} {:<14} {:>4} tabs  {:<10} {}",
            group.id,
            group.kind.to_string(),
            group.tabs.len(),
            flag,
            group.name
        );
        for tab in &group.tabs {
            println!("    - {}  <{}>", tab.display_title(), tab.url);
        }
    }

    Ok(())
}
