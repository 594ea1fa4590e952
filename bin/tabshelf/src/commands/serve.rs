use serde_json::{json, Value};
use std::path::Path;
use tabshelf_core::Response;
use tabshelf_service::TriggerEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Context;

/// JSON-lines loop: one message per stdin line, one envelope per stdout
/// line. Broadcasts are interleaved as `{"broadcast": ...}` lines. Lines
/// naming no known command produce no output.
pub async fn run(config_override: Option<&Path>) -> anyhow::Result<()> {
    let ctx = Context::load(config_override)?;
    let runtime = ctx.start_runtime().await?;
    runtime.triggers().handle(TriggerEvent::Installed).await;
    let client = runtime.client();

    // Single writer so envelopes and broadcasts never tear.
    let (out_tx, mut out_rx) = mpsc::channel::<String>(64);
    let writer = tokio::spawn(async move {
        while let Some(line) = out_rx.recv().await {
            println!("{}", line);
        }
    });

    let mut broadcasts = client.subscribe();
    let broadcast_out = out_tx.clone();
    let forwarder = tokio::spawn(async move {
        loop {
            match broadcasts.recv().await {
                Ok(message) => {
                    let line = json!({ "broadcast": message }).to_string();
                    if broadcast_out.send(line).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Dropped broadcasts"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!(store = %ctx.store_path().display(), "Serving on stdin/stdout");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Value>(line) {
            Ok(payload) => client.request(payload).await?,
            Err(e) => Some(Response::failure(format!("Invalid JSON message: {}", e))),
        };
        match response {
            Some(response) => out_tx.send(serde_json::to_string(&response)?).await?,
            None => debug!("Message ignored"),
        }
    }

    info!("stdin closed, shutting down");
    forwarder.abort();
    drop(out_tx);
    drain_writer(writer).await;
    runtime.shutdown();
    Ok(())
}

/// Wait for the output writer to flush. `false` when the task died.
async fn drain_writer(writer: JoinHandle<()>) -> bool {
    match writer.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Output writer task failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_writer_reports_task_failure() {
        let ok = tokio::spawn(async {});
        assert!(drain_writer(ok).await);

        let failed = tokio::spawn(async {
            panic!("stdout closed");
        });
        assert!(!drain_writer(failed).await);

        let aborted = tokio::spawn(std::future::pending::<()>());
        aborted.abort();
        assert!(!drain_writer(aborted).await);
    }
}
