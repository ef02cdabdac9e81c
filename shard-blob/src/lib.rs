//! # shard-blob: chunked blob storage for size-capped key-value stores
//!
//! `shard-blob` stores binary objects (images, mostly) in a key-value store
//! whose items are too small to hold them whole. A blob is base64 encoded,
//! split into fixed-width text chunks, and written as one metadata record
//! plus one record per chunk, all under the owner's partition. Reads fetch
//! the records in one prefix query, validate them against the metadata, and
//! put the encoded text back together.
//!
//! ## Quick Start
//!
//! ```rust
//! use shard_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let blobs = ChunkedBlobs::new(MemoryChunkStore::new(), ChunkConfig::default())?;
//!
//! let id = BlobId::from_source_key("uploads/cat.png");
//! assert_eq!(id.as_str(), "uploads__cat.png");
//!
//! blobs.put_bytes("alice", &id, "image/png", b"not really a png").await?;
//! let (content_type, bytes) = blobs.read_bytes("alice", &id).await?;
//! assert_eq!(content_type, "image/png");
//! assert_eq!(bytes, b"not really a png");
//! # Ok(())
//! # }
//! ```
//!
//! ## Record layout
//!
//! ```text
//! userId = <owner>   sk = <blobId>#META          contentType, sizeBytes, totalChunks
//! userId = <owner>   sk = <blobId>#CHUNK#0001    chunkIndex = 0, data
//! userId = <owner>   sk = <blobId>#CHUNK#0002    chunkIndex = 1, data
//! ```
//!
//! Storage sits behind [`ChunkStore`], [`ObjectSource`] and [`UploadSigner`].
//! DynamoDB and S3 implementations live in [`dynamo`] and [`s3`]; the
//! in-memory ones in [`memory`] back the tests.

pub mod adapter;
pub mod aws;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod dynamo;
mod error;
pub mod identity;
pub mod ingest;
pub mod memory;
pub mod owner;
pub mod reader;
mod receipt;
pub mod record;
pub mod s3;
pub mod store;
mod types;
pub mod writer;

// Re-export main types for clean API
pub use adapter::ChunkedBlobs;
pub use aws::AwsSettings;
pub use catalog::BlobCatalog;
pub use codec::EncodedBlob;
pub use config::ChunkConfig;
pub use dynamo::DynamoChunkStore;
pub use error::{BlobError, BlobResult};
pub use identity::derive_blob_id;
pub use ingest::{IngestFailure, IngestReceipt, IngestReport, Ingestor, ObjectRef, S3Event};
pub use memory::{MemoryChunkStore, MemoryObjectSource};
pub use owner::OwnerResolver;
pub use reader::{reassemble, BlobReader};
pub use receipt::{ReassembledBlob, WriteReceipt};
pub use record::{ChunkRecord, MetadataRecord};
pub use s3::S3ObjectSource;
pub use store::{AttrValue, ChunkStore, ItemKey, ObjectSource, ScanPage, ScanRequest, StoredItem, UploadSigner};
pub use types::{BlobId, BlobSummary, FetchedObject};
pub use writer::BlobWriter;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobError, BlobId, BlobResult, BlobSummary, ChunkConfig, ChunkStore, ChunkedBlobs,
        MemoryChunkStore, ObjectSource, UploadSigner,
    };
}
