use std::str::FromStr;

use shard_blob::config::{
    DEFAULT_CHUNK_SIZE_CHARS, DEFAULT_MAX_UNPROCESSED_RESUBMITS, DEFAULT_OWNER_ID, DEFAULT_WRITE_BATCH_SIZE,
};
use shard_blob::ingest::DEFAULT_INGEST_CONCURRENCY;
use shard_blob::{AwsSettings, ChunkConfig};
use shard_core::{bail_shard, ShardConfig, ShardConfigSnapshot, ShardResult};

pub const DEFAULT_TABLE: &str = "Images";
pub const DEFAULT_UPLOADS_BUCKET: &str = "site-cloud25f-uploads";
pub const DEFAULT_PRESIGN_EXPIRES: u64 = 300;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3030;

/// Typed view of everything the images service reads from [`ShardConfig`]
#[derive(Debug, Clone)]
pub struct ImagesSettings {
    pub table: String,
    pub uploads_bucket: String,
    pub presign_expires: u64,
    pub chunk: ChunkConfig,
    pub aws: AwsSettings,
    /// Path-style S3 addressing; on by default behind a custom endpoint
    pub path_style: bool,
    pub ingest_concurrency: usize,
    pub host: String,
    pub port: u16,
}

/// Parse `key` if present. A present but unparseable value is an error
/// rather than a silent fallback to the default.
fn typed<T: FromStr>(snapshot: &ShardConfigSnapshot, key: &str, default: T) -> ShardResult<T> {
    match snapshot.get(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(value),
            Err(_) => {
                bail_shard!(bad_request, "config {} has invalid value {:?}", key, raw);
            }
        },
    }
}

fn non_empty(snapshot: &ShardConfigSnapshot, key: &str) -> Option<String> {
    snapshot
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ImagesSettings {
    pub fn from_config(config: &ShardConfig) -> ShardResult<Self> {
        let snapshot = config.snapshot();

        let chunk = ChunkConfig::new()
            .with_chunk_size(typed(&snapshot, "chunk.size", DEFAULT_CHUNK_SIZE_CHARS)?)
            .with_write_batch_size(typed(&snapshot, "chunk.batch_size", DEFAULT_WRITE_BATCH_SIZE)?)
            .with_max_unprocessed_resubmits(typed(
                &snapshot,
                "chunk.max_resubmits",
                DEFAULT_MAX_UNPROCESSED_RESUBMITS,
            )?)
            .with_default_owner(non_empty(&snapshot, "owner.default").unwrap_or_else(|| DEFAULT_OWNER_ID.to_string()));
        chunk.validate()?;

        let mut aws = AwsSettings::default().with_max_attempts(typed(
            &snapshot,
            "aws.max_attempts",
            shard_blob::aws::DEFAULT_MAX_ATTEMPTS,
        )?);
        aws.region = non_empty(&snapshot, "aws.region");
        aws.endpoint_url = non_empty(&snapshot, "aws.endpoint");
        aws.access_key_id = non_empty(&snapshot, "aws.access_key_id");
        aws.secret_access_key = non_empty(&snapshot, "aws.secret_access_key");
        let path_style = typed(&snapshot, "aws.path_style", aws.endpoint_url.is_some())?;

        let ingest_concurrency = typed(&snapshot, "ingest.concurrency", DEFAULT_INGEST_CONCURRENCY)?;
        if ingest_concurrency == 0 {
            bail_shard!(bad_request, "ingest.concurrency must be positive");
        }

        Ok(Self {
            table: non_empty(&snapshot, "images.table").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            uploads_bucket: non_empty(&snapshot, "uploads.bucket")
                .unwrap_or_else(|| DEFAULT_UPLOADS_BUCKET.to_string()),
            presign_expires: typed(&snapshot, "presign.expires", DEFAULT_PRESIGN_EXPIRES)?,
            chunk,
            aws,
            path_style,
            ingest_concurrency,
            host: non_empty(&snapshot, "http.host").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: typed(&snapshot, "http.port", DEFAULT_PORT)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
