use serde::{Deserialize, Serialize};

use crate::{codec, BlobId, BlobResult};

/// Receipt returned after a blob's records were written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReceipt {
    pub owner_id: String,
    pub blob_id: BlobId,
    pub content_type: String,
    pub size_bytes: u64,
    pub total_chunks: u32,
}

/// A blob read back from its records, still in encoded form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassembledBlob {
    pub owner_id: String,
    pub blob_id: BlobId,
    pub content_type: String,
    pub size_bytes: u64,
    pub total_chunks: u32,
    pub encoded_text: String,
}

impl ReassembledBlob {
    /// Decode the concatenated text back to the original bytes
    pub fn decode(&self) -> BlobResult<Vec<u8>> {
        codec::decode(&self.encoded_text)
    }
}
