//! Ingestion of object-store notifications.
//!
//! Each record of an S3 `ObjectCreated` notification names a bucket and key.
//! The object is fetched, its owner resolved from user metadata, and its
//! bytes stored through [`ChunkedBlobs`]. Records are independent: a
//! malformed or failing record never stops its siblings.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::record::DEFAULT_CONTENT_TYPE;
use crate::{derive_blob_id, BlobError, BlobResult, ChunkedBlobs, ObjectSource, OwnerResolver};

pub const DEFAULT_INGEST_CONCURRENCY: usize = 4;

/// An S3 event notification. Records are kept as raw JSON so one bad record
/// does not prevent the others from being read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<Value>,
}

impl S3Event {
    pub fn from_json(raw: &str) -> BlobResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Event with one well-formed record
    pub fn for_object(bucket: &str, key: &str) -> Self {
        Self {
            records: vec![serde_json::json!({
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": { "bucket": { "name": bucket }, "object": { "key": key } }
            })],
        }
    }
}

/// Bucket and key named by one event record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

#[derive(Deserialize)]
struct RecordShape {
    s3: Option<S3Entity>,
}

#[derive(Deserialize)]
struct S3Entity {
    bucket: Option<NamedEntity>,
    object: Option<KeyedEntity>,
}

#[derive(Deserialize)]
struct NamedEntity {
    name: Option<String>,
}

#[derive(Deserialize)]
struct KeyedEntity {
    key: Option<String>,
}

impl ObjectRef {
    /// Extract the bucket and key, or explain why the record is unusable
    pub fn from_record(record: &Value) -> BlobResult<Self> {
        let shape: RecordShape = serde_json::from_value(record.clone())
            .map_err(|e| BlobError::malformed_event(e.to_string()))?;
        let s3 = shape
            .s3
            .ok_or_else(|| BlobError::malformed_event("record has no s3 section"))?;

        let bucket = s3.bucket.and_then(|b| b.name).filter(|name| !name.is_empty());
        let key = s3.object.and_then(|o| o.key).filter(|key| !key.is_empty());

        match (bucket, key) {
            (Some(bucket), Some(key)) => Ok(Self { bucket, key }),
            _ => Err(BlobError::malformed_event("record without bucket/key")),
        }
    }
}

/// One object stored by ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReceipt {
    pub bucket: String,
    pub key: String,
    pub owner_id: String,
    pub blob_id: String,
    pub size_bytes: u64,
    pub total_chunks: u32,
}

/// One object that could not be stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFailure {
    pub bucket: String,
    pub key: String,
    pub error: String,
}

/// Outcome of handling one notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub processed: Vec<IngestReceipt>,
    /// Reasons malformed records were skipped
    pub skipped: Vec<String>,
    pub failed: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Turns object-store notifications into stored chunked blobs
pub struct Ingestor {
    objects: Arc<dyn ObjectSource>,
    blobs: Arc<ChunkedBlobs>,
    owners: OwnerResolver,
    concurrency: usize,
}

impl Ingestor {
    pub fn new(objects: Arc<dyn ObjectSource>, blobs: Arc<ChunkedBlobs>) -> Self {
        let owners = OwnerResolver::new(blobs.config().default_owner.clone());
        Self {
            objects,
            blobs,
            owners,
            concurrency: DEFAULT_INGEST_CONCURRENCY,
        }
    }

    /// Records of one event processed at the same time
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch one object and store it as a chunked blob
    #[instrument(skip(self))]
    pub async fn ingest_object(&self, bucket: &str, key: &str) -> BlobResult<IngestReceipt> {
        let object = self.objects.fetch(bucket, key).await?;

        let owner_id = self.owners.resolve(&object.metadata);
        let blob_id = derive_blob_id(key);
        let content_type = object
            .content_type
            .as_deref()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        let size_bytes = object.size_bytes();

        info!(owner = %owner_id, %blob_id, size_bytes, "storing object");
        let receipt = self
            .blobs
            .put_sized(&owner_id, &blob_id, content_type, size_bytes, &object.bytes)
            .await?;

        Ok(IngestReceipt {
            bucket: bucket.to_string(),
            key: key.to_string(),
            owner_id: receipt.owner_id,
            blob_id: receipt.blob_id.0,
            size_bytes: receipt.size_bytes,
            total_chunks: receipt.total_chunks,
        })
    }

    /// Process every record of `event`, isolating failures per record
    pub async fn handle_event(&self, event: &S3Event) -> IngestReport {
        let mut report = IngestReport::default();
        let mut targets = Vec::with_capacity(event.records.len());

        for (position, record) in event.records.iter().enumerate() {
            match ObjectRef::from_record(record) {
                Ok(target) => targets.push(target),
                Err(err) => {
                    warn!(record = position, error = %err, "skipping event record");
                    report.skipped.push(err.to_string());
                }
            }
        }

        let outcomes: Vec<(ObjectRef, BlobResult<IngestReceipt>)> = stream::iter(targets)
            .map(|target| async move {
                let outcome = self.ingest_object(&target.bucket, &target.key).await;
                (target, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        for (target, outcome) in outcomes {
            match outcome {
                Ok(receipt) => report.processed.push(receipt),
                Err(err) => {
                    error!(bucket = %target.bucket, key = %target.key, error = %err, "ingestion failed");
                    report.failed.push(IngestFailure {
                        bucket: target.bucket,
                        key: target.key,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "event handled"
        );
        report
    }
}
