use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::{
    BlobError, BlobId, BlobResult, ChunkConfig, ChunkRecord, ChunkStore, MetadataRecord,
    StoredItem, WriteReceipt,
};

/// Write path: one metadata record, then the chunk records in batches.
///
/// The metadata goes first so that it declares `totalChunks` before any chunk
/// exists. Batches are not atomic; if a batch fails, the blob is left with
/// fewer chunks than declared and readers report it as corrupt. Chunk records
/// beyond the new `totalChunks` left over from an earlier, larger write are
/// not removed.
pub struct BlobWriter {
    store: Arc<dyn ChunkStore>,
    config: ChunkConfig,
}

impl BlobWriter {
    pub fn new(store: Arc<dyn ChunkStore>, config: ChunkConfig) -> Self {
        Self { store, config }
    }

    #[instrument(skip(self, chunks), fields(total_chunks = chunks.len()))]
    pub async fn write_blob(
        &self,
        owner_id: &str,
        blob_id: &BlobId,
        content_type: &str,
        size_bytes: u64,
        chunks: &[String],
    ) -> BlobResult<WriteReceipt> {
        if chunks.len() > self.config.max_chunks {
            return Err(BlobError::invalid(format!(
                "blob {} needs {} chunks, more than the limit of {}; raise the chunk size",
                blob_id,
                chunks.len(),
                self.config.max_chunks
            )));
        }
        let total_chunks = chunks.len() as u32;

        let meta = MetadataRecord {
            owner_id: owner_id.to_string(),
            blob_id: blob_id.clone(),
            content_type: content_type.to_string(),
            size_bytes,
            total_chunks,
        };
        info!(owner = owner_id, %blob_id, total_chunks, "writing metadata record");
        self.store.put_item(meta.to_item()).await?;

        let batch_size = self.config.write_batch_size.max(1);
        for (batch_number, batch) in chunks.chunks(batch_size).enumerate() {
            let offset = batch_number * batch_size;
            let items: Vec<StoredItem> = batch
                .iter()
                .enumerate()
                .map(|(i, data)| {
                    ChunkRecord {
                        owner_id: owner_id.to_string(),
                        blob_id: blob_id.clone(),
                        chunk_index: (offset + i) as u32,
                        data: data.clone(),
                    }
                    .to_item()
                })
                .collect();

            debug!(%blob_id, first = offset, count = items.len(), "writing chunk batch");
            self.store.put_batch(items).await?;
        }

        info!(owner = owner_id, %blob_id, total_chunks, "chunks written");

        Ok(WriteReceipt {
            owner_id: owner_id.to_string(),
            blob_id: blob_id.clone(),
            content_type: content_type.to_string(),
            size_bytes,
            total_chunks,
        })
    }
}
