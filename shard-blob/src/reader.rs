use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::record::{blob_prefix, parse_sort_key, RecordKind};
use crate::{
    BlobError, BlobId, BlobResult, ChunkRecord, ChunkStore, MetadataRecord, ReassembledBlob,
    StoredItem,
};

/// Read path: one prefix query, then [`reassemble`].
pub struct BlobReader {
    store: Arc<dyn ChunkStore>,
}

impl BlobReader {
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn read_blob(&self, owner_id: &str, blob_id: &BlobId) -> BlobResult<ReassembledBlob> {
        let items = self
            .store
            .query_prefix(owner_id, &blob_prefix(blob_id))
            .await?;
        debug!(items = items.len(), "queried blob records");

        reassemble(blob_id, items).inspect_err(|err| {
            if let BlobError::CorruptBlob { reason, .. } = err {
                warn!(owner = owner_id, %blob_id, %reason, "blob failed validation");
            }
        })
    }
}

/// Rebuild a blob's encoded text from its stored items, in any order.
///
/// Items whose sort key does not belong to `blob_id` are ignored. Chunks are
/// bounded by the metadata's `totalChunks`, ordered by their numeric
/// `chunkIndex`, and must cover `0..totalChunks` exactly once.
pub fn reassemble(blob_id: &BlobId, items: Vec<StoredItem>) -> BlobResult<ReassembledBlob> {
    let mut meta: Option<MetadataRecord> = None;
    let mut chunks: Vec<ChunkRecord> = Vec::new();

    for item in &items {
        match parse_sort_key(blob_id, item.sort_key()) {
            Some(RecordKind::Meta) => {
                if meta.is_some() {
                    return Err(BlobError::corrupt(blob_id.as_str(), "more than one metadata record"));
                }
                meta = Some(MetadataRecord::from_item(blob_id.clone(), item)?);
            }
            Some(RecordKind::Chunk(position)) => {
                chunks.push(ChunkRecord::from_item(blob_id.clone(), position, item)?);
            }
            None => {}
        }
    }

    let meta = match meta {
        Some(meta) => meta,
        None if chunks.is_empty() => return Err(BlobError::not_found(blob_id.as_str())),
        None => {
            return Err(BlobError::corrupt(
                blob_id.as_str(),
                format!("{} chunk records but no metadata record", chunks.len()),
            ))
        }
    };

    let total = meta.total_chunks;
    chunks.retain(|chunk| chunk.chunk_index < total);
    chunks.sort_by_key(|chunk| chunk.chunk_index);

    if chunks.len() != total as usize {
        return Err(BlobError::corrupt(
            blob_id.as_str(),
            format!("metadata declares {} chunks, found {}", total, chunks.len()),
        ));
    }
    if let Some((expected, chunk)) = chunks
        .iter()
        .enumerate()
        .find(|(expected, chunk)| chunk.chunk_index as usize != *expected)
    {
        return Err(BlobError::corrupt(
            blob_id.as_str(),
            format!("expected chunk index {}, found {}", expected, chunk.chunk_index),
        ));
    }

    let encoded_text: String = chunks.iter().map(|chunk| chunk.data.as_str()).collect();

    Ok(ReassembledBlob {
        owner_id: meta.owner_id,
        blob_id: meta.blob_id,
        content_type: meta.content_type,
        size_bytes: meta.size_bytes,
        total_chunks: total,
        encoded_text,
    })
}
