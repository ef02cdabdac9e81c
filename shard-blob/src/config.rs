use crate::{BlobError, BlobResult};

/// Default slice width in base64 characters. Keeps a chunk item well under
/// DynamoDB's 400 KB item cap once keys and attribute names are added.
pub const DEFAULT_CHUNK_SIZE_CHARS: usize = 350_000;

/// `BatchWriteItem` accepts at most 25 put requests.
pub const DEFAULT_WRITE_BATCH_SIZE: usize = 25;

/// Four-digit chunk sort keys cap a blob at 9999 chunks.
pub const MAX_CHUNKS_PER_BLOB: usize = 9_999;

pub const DEFAULT_OWNER_ID: &str = "anonymous";

pub const DEFAULT_MAX_UNPROCESSED_RESUBMITS: u32 = 5;

/// Configuration for chunked blob operations
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Width of each chunk in encoded characters. The store's item size cap
    /// bounds this from above; nothing here enforces it.
    pub chunk_size_chars: usize,

    /// Chunk records per batched put
    pub write_batch_size: usize,

    /// Upper bound on chunks per blob, limited by the sort key's digit width
    pub max_chunks: usize,

    /// How many times unprocessed batch items are resubmitted before the
    /// write is reported as failed
    pub max_unprocessed_resubmits: u32,

    /// Owner used when object metadata names none
    pub default_owner: String,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size_chars: DEFAULT_CHUNK_SIZE_CHARS,
            write_batch_size: DEFAULT_WRITE_BATCH_SIZE,
            max_chunks: MAX_CHUNKS_PER_BLOB,
            max_unprocessed_resubmits: DEFAULT_MAX_UNPROCESSED_RESUBMITS,
            default_owner: DEFAULT_OWNER_ID.to_string(),
        }
    }
}

impl ChunkConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk width in encoded characters
    pub fn with_chunk_size(mut self, chars: usize) -> Self {
        self.chunk_size_chars = chars;
        self
    }

    pub fn with_write_batch_size(mut self, size: usize) -> Self {
        self.write_batch_size = size;
        self
    }

    pub fn with_max_unprocessed_resubmits(mut self, attempts: u32) -> Self {
        self.max_unprocessed_resubmits = attempts;
        self
    }

    pub fn with_default_owner<S: Into<String>>(mut self, owner: S) -> Self {
        self.default_owner = owner.into();
        self
    }

    /// Reject settings the write path cannot honour
    pub fn validate(&self) -> BlobResult<()> {
        if self.chunk_size_chars == 0 {
            return Err(BlobError::invalid("chunk size must be a positive number of characters"));
        }
        if self.write_batch_size == 0 || self.write_batch_size > DEFAULT_WRITE_BATCH_SIZE {
            return Err(BlobError::invalid(format!(
                "write batch size must be 1-{}, got {}",
                DEFAULT_WRITE_BATCH_SIZE, self.write_batch_size
            )));
        }
        if self.max_chunks == 0 || self.max_chunks > MAX_CHUNKS_PER_BLOB {
            return Err(BlobError::invalid(format!(
                "max chunks must be 1-{}, got {}",
                MAX_CHUNKS_PER_BLOB, self.max_chunks
            )));
        }
        if self.default_owner.trim().is_empty() {
            return Err(BlobError::invalid("default owner must not be empty"));
        }
        Ok(())
    }
}
