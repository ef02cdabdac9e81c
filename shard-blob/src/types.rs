use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Flat identifier of a chunked blob, safe to embed in a sort key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(pub String);

impl BlobId {
    /// Derive the identifier for an object-store key
    pub fn from_source_key(source_key: &str) -> Self {
        crate::identity::derive_blob_id(source_key)
    }

    /// Create from an identifier that is already flat (e.g. a URL path segment)
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BlobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// An object read in full from the object store
#[derive(Debug, Clone, Default)]
pub struct FetchedObject {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    /// Length reported by the object store, if any
    pub content_length: Option<u64>,
    /// User metadata attached to the object
    pub metadata: HashMap<String, String>,
}

impl FetchedObject {
    pub fn new<B: Into<Bytes>>(bytes: B) -> Self {
        Self {
            bytes: bytes.into(),
            ..Self::default()
        }
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Original size in bytes: the store's reported length, else the body length
    pub fn size_bytes(&self) -> u64 {
        self.content_length.unwrap_or(self.bytes.len() as u64)
    }
}

/// Catalog entry for one blob, built from its metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobSummary {
    pub blob_id: BlobId,
    pub owner_id: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub total_chunks: u32,
}
