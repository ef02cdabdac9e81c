//! Handle one S3 notification document.
//!
//! Usage: `ingest [event.json]`. Without a path (or with `-`) the event is
//! read from stdin. The report is printed as JSON; the exit status is
//! non-zero when any record failed.

use anyhow::{bail, Context, Result};
use shard_blob::S3Event;
use shard_core::ShardConfig;
use tokio::io::AsyncReadExt;

async fn read_event() -> Result<String> {
    match std::env::args().nth(1) {
        Some(path) if path != "-" => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading event from {path}")),
        _ => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("reading event from stdin")?;
            Ok(raw)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ShardConfig::from_env("SHARD");
    shard_images::init_tracing(&config);

    let event = S3Event::from_json(&read_event().await?)?;
    let ingestor = shard_images::ingestor(&config).await?;

    let report = ingestor.handle_event(&event).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.failed.is_empty() {
        bail!("{} of {} records failed", report.failed.len(), event.records.len());
    }
    Ok(())
}
