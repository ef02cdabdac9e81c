use std::sync::Arc;

use crate::{
    codec, BlobCatalog, BlobId, BlobReader, BlobResult, BlobSummary, BlobWriter, ChunkConfig,
    ChunkStore, ReassembledBlob, WriteReceipt,
};

/// The main entry point: encode + write, read + reassemble, and list,
/// all over one explicitly supplied store.
pub struct ChunkedBlobs {
    writer: BlobWriter,
    reader: BlobReader,
    catalog: BlobCatalog,
    config: ChunkConfig,
}

impl ChunkedBlobs {
    /// Create over any store; fails if the config cannot be honoured
    pub fn new<S: ChunkStore + 'static>(store: S, config: ChunkConfig) -> BlobResult<Self> {
        Self::from_arc(Arc::new(store), config)
    }

    pub fn from_arc(store: Arc<dyn ChunkStore>, config: ChunkConfig) -> BlobResult<Self> {
        config.validate()?;
        Ok(Self {
            writer: BlobWriter::new(Arc::clone(&store), config.clone()),
            reader: BlobReader::new(Arc::clone(&store)),
            catalog: BlobCatalog::new(store),
            config,
        })
    }

    /// Encode `raw` and store it as metadata plus chunk records
    pub async fn put_bytes(
        &self,
        owner_id: &str,
        blob_id: &BlobId,
        content_type: &str,
        raw: &[u8],
    ) -> BlobResult<WriteReceipt> {
        self.put_sized(owner_id, blob_id, content_type, raw.len() as u64, raw)
            .await
    }

    /// Like [`put_bytes`](Self::put_bytes) with an externally reported size
    pub async fn put_sized(
        &self,
        owner_id: &str,
        blob_id: &BlobId,
        content_type: &str,
        size_bytes: u64,
        raw: &[u8],
    ) -> BlobResult<WriteReceipt> {
        let encoded = codec::encode(raw, self.config.chunk_size_chars)?;
        self.writer
            .write_blob(owner_id, blob_id, content_type, size_bytes, &encoded.chunks)
            .await
    }

    /// Content type and encoded text of a stored blob
    pub async fn read(&self, owner_id: &str, blob_id: &BlobId) -> BlobResult<ReassembledBlob> {
        self.reader.read_blob(owner_id, blob_id).await
    }

    /// Content type and original bytes of a stored blob
    pub async fn read_bytes(&self, owner_id: &str, blob_id: &BlobId) -> BlobResult<(String, Vec<u8>)> {
        let blob = self.read(owner_id, blob_id).await?;
        let bytes = blob.decode()?;
        Ok((blob.content_type, bytes))
    }

    pub async fn list(&self, limit: usize) -> BlobResult<Vec<BlobSummary>> {
        self.catalog.list_blobs(limit).await
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }
}
