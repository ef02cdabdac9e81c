//! Metadata and chunk records and their key layout.
//!
//! ```text
//! userId (partition)   sk (sort)
//! alice                uploads__cat.png#META
//! alice                uploads__cat.png#CHUNK#0001
//! alice                uploads__cat.png#CHUNK#0002
//! ```
//!
//! Chunk positions are 1-based and zero-padded to four digits so that lexical
//! order matches numeric order, which limits a blob to 9999 chunks.

use crate::{BlobError, BlobId, BlobResult, StoredItem};

pub const KEY_DELIMITER: char = '#';
pub const META_MARKER: &str = "META";
pub const CHUNK_MARKER: &str = "CHUNK";
pub const CHUNK_POSITION_WIDTH: usize = 4;

pub const ATTR_CONTENT_TYPE: &str = "contentType";
pub const ATTR_SIZE_BYTES: &str = "sizeBytes";
pub const ATTR_TOTAL_CHUNKS: &str = "totalChunks";
pub const ATTR_CHUNK_INDEX: &str = "chunkIndex";
pub const ATTR_DATA: &str = "data";

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Sort key prefix shared by every record of a blob
pub fn blob_prefix(blob_id: &BlobId) -> String {
    format!("{}{}", blob_id, KEY_DELIMITER)
}

pub fn meta_sort_key(blob_id: &BlobId) -> String {
    format!("{}{}{}", blob_id, KEY_DELIMITER, META_MARKER)
}

/// `position` is 1-based
pub fn chunk_sort_key(blob_id: &BlobId, position: u32) -> String {
    format!(
        "{}{}{}{}{:0width$}",
        blob_id,
        KEY_DELIMITER,
        CHUNK_MARKER,
        KEY_DELIMITER,
        position,
        width = CHUNK_POSITION_WIDTH
    )
}

/// Kind of record a sort key addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Meta,
    /// 1-based position parsed from the key
    Chunk(u32),
}

/// Classify `sort_key` as a record of `blob_id`.
///
/// Returns `None` for keys that merely share the prefix, such as records of a
/// blob whose id is `blob_id` followed by `#`.
pub fn parse_sort_key(blob_id: &BlobId, sort_key: &str) -> Option<RecordKind> {
    let rest = sort_key.strip_prefix(blob_id.as_str())?;
    let rest = rest.strip_prefix(KEY_DELIMITER)?;

    if rest == META_MARKER {
        return Some(RecordKind::Meta);
    }

    let digits = rest.strip_prefix(CHUNK_MARKER)?.strip_prefix(KEY_DELIMITER)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(RecordKind::Chunk)
}

/// Blob id of a metadata sort key, if it is one
pub fn blob_id_from_meta_key(sort_key: &str) -> Option<BlobId> {
    let suffix = format!("{}{}", KEY_DELIMITER, META_MARKER);
    sort_key
        .strip_suffix(suffix.as_str())
        .map(|id| BlobId(id.to_string()))
}

/// The per-blob record declaring content type, size and chunk count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub owner_id: String,
    pub blob_id: BlobId,
    pub content_type: String,
    pub size_bytes: u64,
    pub total_chunks: u32,
}

impl MetadataRecord {
    pub fn to_item(&self) -> StoredItem {
        StoredItem::new(self.owner_id.clone(), meta_sort_key(&self.blob_id))
            .with_string(ATTR_CONTENT_TYPE, self.content_type.clone())
            .with_number(ATTR_SIZE_BYTES, self.size_bytes)
            .with_number(ATTR_TOTAL_CHUNKS, u64::from(self.total_chunks))
    }

    pub fn from_item(blob_id: BlobId, item: &StoredItem) -> BlobResult<Self> {
        let total_chunks = item
            .number(ATTR_TOTAL_CHUNKS)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                BlobError::corrupt(blob_id.as_str(), "metadata record has no valid totalChunks")
            })?;

        Ok(Self {
            owner_id: item.partition_key().to_string(),
            content_type: item
                .string(ATTR_CONTENT_TYPE)
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
            size_bytes: item.number(ATTR_SIZE_BYTES).unwrap_or(0),
            total_chunks,
            blob_id,
        })
    }
}

/// One slice of a blob's encoded text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    pub owner_id: String,
    pub blob_id: BlobId,
    /// 0-based; the key carries the same value plus one
    pub chunk_index: u32,
    pub data: String,
}

impl ChunkRecord {
    pub fn position(&self) -> u32 {
        self.chunk_index + 1
    }

    pub fn to_item(&self) -> StoredItem {
        StoredItem::new(self.owner_id.clone(), chunk_sort_key(&self.blob_id, self.position()))
            .with_number(ATTR_CHUNK_INDEX, u64::from(self.chunk_index))
            .with_string(ATTR_DATA, self.data.clone())
    }

    /// `position` is the 1-based value from the item's sort key. The stored
    /// `chunkIndex` attribute wins when present.
    pub fn from_item(blob_id: BlobId, position: u32, item: &StoredItem) -> BlobResult<Self> {
        let chunk_index = match item.number(ATTR_CHUNK_INDEX) {
            Some(n) => u32::try_from(n).map_err(|_| {
                BlobError::corrupt(blob_id.as_str(), format!("chunk index {} out of range", n))
            })?,
            None => position.checked_sub(1).ok_or_else(|| {
                BlobError::corrupt(blob_id.as_str(), "chunk record with position 0")
            })?,
        };

        let data = item.string(ATTR_DATA).ok_or_else(|| {
            BlobError::corrupt(
                blob_id.as_str(),
                format!("chunk {} has no data attribute", item.sort_key()),
            )
        })?;

        Ok(Self {
            owner_id: item.partition_key().to_string(),
            chunk_index,
            data: data.to_string(),
            blob_id,
        })
    }
}
