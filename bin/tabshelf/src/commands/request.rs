use serde_json::Value;
use std::path::Path;

use super::Context;

/// Dispatch a single message and print its envelope.
pub async fn run(config_override: Option<&Path>, message: &str) -> anyhow::Result<()> {
    let payload: Value = serde_json::from_str(message)
        .map_err(|e| anyhow::anyhow!("Invalid JSON message: {}", e))?;

    let ctx = Context::load(config_override)?;
    let runtime = ctx.start_runtime().await?;
    let response = runtime.dispatcher().dispatch(&payload).await;
    runtime.shutdown();

    match response {
        Some(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.ok {
                std::process::exit(1);
            }
            Ok(())
        }
        None => {
            let name = payload.get("type").and_then(Value::as_str).unwrap_or("<none>");
            anyhow::bail!("No command handles message type: {}", name)
        }
    }
}
