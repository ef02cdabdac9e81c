mod settings;

use std::sync::Arc;

use anyhow::Result;
use shard_axum::{AxumApp, ImagesState};
use shard_blob::{ChunkedBlobs, DynamoChunkStore, Ingestor, S3ObjectSource};
use shard_core::ShardConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use settings::ImagesSettings;

/// `RUST_LOG` wins; otherwise `log.level` from config, otherwise `info`.
pub fn init_tracing(config: &ShardConfig) {
    let fallback = config.get("log.level").unwrap_or("info").to_string();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Blob storage over DynamoDB, plus the S3 client shared by ingestion and presigning
async fn connect(settings: &ImagesSettings) -> Result<(Arc<ChunkedBlobs>, Arc<S3ObjectSource>)> {
    let sdk = settings.aws.load().await;

    let store = DynamoChunkStore::new(&sdk, settings.table.clone())
        .with_max_resubmits(settings.chunk.max_unprocessed_resubmits);
    let blobs = Arc::new(ChunkedBlobs::new(store, settings.chunk.clone())?);
    let s3 = Arc::new(S3ObjectSource::new(&sdk, settings.path_style));

    info!(table = %settings.table, bucket = %settings.uploads_bucket, "storage clients ready");
    Ok((blobs, s3))
}

pub async fn build(config: &ShardConfig) -> Result<AxumApp> {
    let settings = ImagesSettings::from_config(config)?;
    let (blobs, s3) = connect(&settings).await?;

    let state = ImagesState::new(blobs)
        .with_signer(s3, settings.uploads_bucket.clone())
        .with_presign_expires(settings.presign_expires);

    Ok(build_with(state))
}

/// Router over explicitly supplied components
pub fn build_with(state: ImagesState) -> AxumApp {
    shard_axum::axum(state)
}

pub async fn ingestor(config: &ShardConfig) -> Result<Ingestor> {
    let settings = ImagesSettings::from_config(config)?;
    let (blobs, s3) = connect(&settings).await?;

    Ok(Ingestor::new(s3, blobs).with_concurrency(settings.ingest_concurrency))
}
