//! Gradewire daemon.
//!
//! Reads one JSON request object per line on stdin, dispatches it through
//! the grading service, and writes one JSON response per line on stdout.
//! Transport framing beyond that is left to whatever fronts the daemon;
//! this loop is the narrow inbound-request interface.
//!
//! Deployments register their course grading modules here before serving;
//! the stock binary ships with the standard `checks` module only.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gradewire_engine::{GraderService, ModuleRegistry};
use oxidized_gradebook::SurrealGradeStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let store = Arc::new(
        SurrealGradeStore::from_env()
            .await
            .context("Failed to open the gradewire store")?,
    );
    let service = GraderService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        Arc::new(ModuleRegistry::with_standard()),
    );

    info!("gradewired ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = service.dispatch_raw(&line).await;
        let encoded = serde_json::to_string(&response)?;
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
