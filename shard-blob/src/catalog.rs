use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::record::{
    blob_id_from_meta_key, ATTR_CONTENT_TYPE, ATTR_SIZE_BYTES, ATTR_TOTAL_CHUNKS,
};
use crate::{BlobError, BlobResult, BlobSummary, ChunkStore, MetadataRecord, ScanRequest};

/// Items evaluated per scan page
const SCAN_PAGE_SIZE: usize = 100;

/// Lists blobs from their metadata records.
///
/// This scans the whole table, chunk records included (they are projected
/// down to their keys), so it costs O(table size). A secondary index keyed
/// on record type would avoid reading chunk items at all.
pub struct BlobCatalog {
    store: Arc<dyn ChunkStore>,
}

impl BlobCatalog {
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self { store }
    }

    /// Up to `limit` blob summaries in the store's native order
    #[instrument(skip(self))]
    pub async fn list_blobs(&self, limit: usize) -> BlobResult<Vec<BlobSummary>> {
        if limit == 0 {
            return Err(BlobError::invalid("limit must be positive"));
        }

        let mut summaries = Vec::new();
        let mut cursor = None;

        loop {
            let request = ScanRequest::new()
                .with_projection([ATTR_CONTENT_TYPE, ATTR_SIZE_BYTES, ATTR_TOTAL_CHUNKS])
                .with_limit(SCAN_PAGE_SIZE)
                .starting_after(cursor.take());
            let page = self.store.scan(request).await?;
            debug!(items = page.items.len(), "scanned page");

            for item in &page.items {
                let Some(blob_id) = blob_id_from_meta_key(item.sort_key()) else {
                    continue;
                };
                match MetadataRecord::from_item(blob_id, item) {
                    Ok(meta) => summaries.push(BlobSummary {
                        blob_id: meta.blob_id,
                        owner_id: meta.owner_id,
                        content_type: meta.content_type,
                        size_bytes: meta.size_bytes,
                        total_chunks: meta.total_chunks,
                    }),
                    Err(err) => warn!(error = %err, "skipping unreadable metadata record"),
                }
                if summaries.len() == limit {
                    return Ok(summaries);
                }
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => return Ok(summaries),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlobId, BlobWriter, ChunkConfig, MemoryChunkStore};

    async fn seeded(count: usize) -> MemoryChunkStore {
        let store = MemoryChunkStore::new();
        let writer = BlobWriter::new(Arc::new(store.clone()), ChunkConfig::default());
        for n in 0..count {
            let chunks = vec!["QUJD".to_string(), "REVG".to_string()];
            writer
                .write_blob("alice", &BlobId(format!("img{n}")), "image/png", 6, &chunks)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn lists_only_metadata_records() {
        let store = seeded(3).await;
        let catalog = BlobCatalog::new(Arc::new(store));

        let listed = catalog.list_blobs(50).await.unwrap();

        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|s| s.total_chunks == 2 && s.size_bytes == 6));
        assert_eq!(listed[0].owner_id, "alice");
        assert_eq!(listed[0].content_type, "image/png");
    }

    #[tokio::test]
    async fn honours_limit_across_pages() {
        // 60 blobs x 3 items spans several scan pages
        let store = seeded(60).await;
        let catalog = BlobCatalog::new(Arc::new(store));

        assert_eq!(catalog.list_blobs(45).await.unwrap().len(), 45);
        assert_eq!(catalog.list_blobs(1000).await.unwrap().len(), 60);
    }

    #[tokio::test]
    async fn zero_limit_is_invalid() {
        let catalog = BlobCatalog::new(Arc::new(MemoryChunkStore::new()));
        assert!(matches!(catalog.list_blobs(0).await, Err(BlobError::Invalid { .. })));
    }
}
