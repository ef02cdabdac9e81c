use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;

use shard_blob::record::{chunk_sort_key, meta_sort_key};
use shard_blob::{
    reassemble, BlobError, BlobId, BlobResult, ChunkConfig, ChunkStore, ChunkedBlobs, FetchedObject,
    Ingestor, MemoryChunkStore, MemoryObjectSource, S3Event, ScanPage, ScanRequest, StoredItem,
};

/// Wraps the memory store and fails every chunk batch after the first `healthy` ones
#[derive(Clone)]
struct FailingBatches {
    inner: MemoryChunkStore,
    healthy: usize,
    calls: Arc<AtomicUsize>,
}

impl FailingBatches {
    fn new(inner: MemoryChunkStore, healthy: usize) -> Self {
        Self {
            inner,
            healthy,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl ChunkStore for FailingBatches {
    async fn put_item(&self, item: StoredItem) -> BlobResult<()> {
        self.inner.put_item(item).await
    }

    async fn put_batch(&self, items: Vec<StoredItem>) -> BlobResult<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.healthy {
            return Err(BlobError::store_write("batch", "ProvisionedThroughputExceeded"));
        }
        self.inner.put_batch(items).await
    }

    async fn query_prefix(&self, partition_key: &str, prefix: &str) -> BlobResult<Vec<StoredItem>> {
        self.inner.query_prefix(partition_key, prefix).await
    }

    async fn scan(&self, request: ScanRequest) -> BlobResult<ScanPage> {
        self.inner.scan(request).await
    }
}

fn small_chunks() -> ChunkConfig {
    ChunkConfig::new().with_chunk_size(8).with_write_batch_size(2)
}

fn image_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 256) as u8).collect()
}

/// A1. Stored bytes read back identically
#[tokio::test]
async fn test_round_trip_preserves_bytes() {
    let blobs = ChunkedBlobs::new(MemoryChunkStore::new(), small_chunks()).unwrap();
    let id = BlobId::from_source_key("uploads/cat.png");
    let raw = image_bytes(100);

    let receipt = blobs.put_bytes("alice", &id, "image/png", &raw).await.unwrap();
    let (content_type, bytes) = blobs.read_bytes("alice", &id).await.unwrap();

    // 100 bytes -> 136 base64 chars -> 17 chunks of 8
    assert_eq!(receipt.total_chunks, 17);
    assert_eq!(content_type, "image/png");
    assert_eq!(bytes, raw);
}

/// A2. Rewriting with fewer chunks leaves stale chunks that reads ignore
#[tokio::test]
async fn test_shrinking_rewrite_reads_new_content() {
    let store = MemoryChunkStore::new();
    let blobs = ChunkedBlobs::new(store.clone(), small_chunks()).unwrap();
    let id = BlobId::from("cat.png");

    blobs.put_bytes("alice", &id, "image/png", &image_bytes(60)).await.unwrap();
    let receipt = blobs.put_bytes("alice", &id, "image/jpeg", b"tiny").await.unwrap();

    assert_eq!(receipt.total_chunks, 1);
    assert!(store.len() > 2, "stale chunks are not reclaimed");
    let (content_type, bytes) = blobs.read_bytes("alice", &id).await.unwrap();
    assert_eq!(content_type, "image/jpeg");
    assert_eq!(bytes, b"tiny");
}

/// A3. A failed batch surfaces as a write error and leaves a blob readers reject
#[tokio::test]
async fn test_partial_write_is_detected_as_corrupt() {
    let store = MemoryChunkStore::new();
    let blobs = ChunkedBlobs::new(FailingBatches::new(store.clone(), 1), small_chunks()).unwrap();
    let id = BlobId::from("broken.png");

    let err = blobs.put_bytes("alice", &id, "image/png", &image_bytes(60)).await.unwrap_err();
    assert!(matches!(err, BlobError::StoreWrite { .. }));

    let err = blobs.read("alice", &id).await.unwrap_err();
    assert!(matches!(err, BlobError::CorruptBlob { .. }), "{err}");
}

/// A4. A lost chunk record is reported, never papered over
#[tokio::test]
async fn test_missing_chunk_is_corrupt() {
    let store = MemoryChunkStore::new();
    let blobs = ChunkedBlobs::new(store.clone(), small_chunks()).unwrap();
    let id = BlobId::from("holey.png");
    blobs.put_bytes("alice", &id, "image/png", &image_bytes(30)).await.unwrap();

    assert!(store.remove("alice", &chunk_sort_key(&id, 2)).is_some());

    assert!(matches!(blobs.read("alice", &id).await, Err(BlobError::CorruptBlob { .. })));
}

/// A5. Chunks left behind by a deleted metadata record are corrupt, not missing
#[tokio::test]
async fn test_orphan_chunks_are_corrupt() {
    let store = MemoryChunkStore::new();
    let blobs = ChunkedBlobs::new(store.clone(), small_chunks()).unwrap();
    let id = BlobId::from("orphan.png");
    blobs.put_bytes("alice", &id, "image/png", b"abcdef").await.unwrap();

    store.remove("alice", &meta_sort_key(&id));

    assert!(matches!(blobs.read("alice", &id).await, Err(BlobError::CorruptBlob { .. })));
    assert!(matches!(
        blobs.read("alice", &BlobId::from("never-written")).await,
        Err(BlobError::NotFound { .. })
    ));
}

/// A6. A blob id that extends another never leaks into its reads
#[tokio::test]
async fn test_prefix_sibling_blobs_stay_separate() {
    let blobs = ChunkedBlobs::new(MemoryChunkStore::new(), small_chunks()).unwrap();
    let short = BlobId::from("a");
    let long = BlobId::from("a#b");

    blobs.put_bytes("alice", &short, "image/png", b"short one").await.unwrap();
    blobs.put_bytes("alice", &long, "image/gif", b"the longer sibling").await.unwrap();

    assert_eq!(blobs.read_bytes("alice", &short).await.unwrap().1, b"short one");
    assert_eq!(blobs.read_bytes("alice", &long).await.unwrap().1, b"the longer sibling");
}

/// B1. Listing returns one summary per blob, across owners
#[tokio::test]
async fn test_list_reports_metadata() {
    let blobs = ChunkedBlobs::new(MemoryChunkStore::new(), small_chunks()).unwrap();
    blobs.put_bytes("alice", &BlobId::from("one.png"), "image/png", &image_bytes(20)).await.unwrap();
    blobs.put_bytes("bob", &BlobId::from("two.gif"), "image/gif", &image_bytes(5)).await.unwrap();

    let mut listed = blobs.list(50).await.unwrap();
    listed.sort_by(|a, b| a.owner_id.cmp(&b.owner_id));

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].owner_id, "alice");
    assert_eq!(listed[0].size_bytes, 20);
    assert_eq!(listed[1].blob_id.as_str(), "two.gif");
    assert_eq!(listed[1].total_chunks, 1);
}

/// C1. One bad record in an event does not stop the others
#[tokio::test]
async fn test_ingest_isolates_failures() {
    let store = MemoryChunkStore::new();
    let blobs = Arc::new(ChunkedBlobs::new(store.clone(), small_chunks()).unwrap());
    let objects = MemoryObjectSource::new();
    objects.insert(
        "uploads",
        "uploads/cat.png",
        FetchedObject::new(image_bytes(40))
            .with_content_type("image/png")
            .with_metadata("UserId", "  carol "),
    );
    objects.insert("uploads", "uploads/blob", FetchedObject::new(b"raw".to_vec()));

    let mut event = S3Event::for_object("uploads", "uploads/cat.png");
    event.records.push(serde_json::json!({ "s3": { "bucket": { "name": "uploads" } } }));
    event.records.extend(S3Event::for_object("uploads", "uploads/missing.png").records);
    event.records.extend(S3Event::for_object("uploads", "uploads/blob").records);

    let ingestor = Ingestor::new(Arc::new(objects), Arc::clone(&blobs)).with_concurrency(2);
    let report = ingestor.handle_event(&event).await;

    assert_eq!(report.processed.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].key, "uploads/missing.png");

    assert_eq!(report.processed[0].owner_id, "carol");
    assert_eq!(report.processed[0].blob_id, "uploads__cat.png");
    assert_eq!(report.processed[1].owner_id, "anonymous");

    let (content_type, bytes) = blobs.read_bytes("carol", &BlobId::from("uploads__cat.png")).await.unwrap();
    assert_eq!(content_type, "image/png");
    assert_eq!(bytes, image_bytes(40));

    let (content_type, _) = blobs.read_bytes("anonymous", &BlobId::from("uploads__blob")).await.unwrap();
    assert_eq!(content_type, "application/octet-stream");
}

/// C2. Reported object size wins over the body length
#[tokio::test]
async fn test_ingest_records_reported_size() {
    let blobs = Arc::new(ChunkedBlobs::new(MemoryChunkStore::new(), small_chunks()).unwrap());
    let objects = MemoryObjectSource::new();
    objects.insert(
        "b",
        "k.png",
        FetchedObject::new(b"abc".to_vec()).with_content_length(3).with_content_type("image/png"),
    );

    let receipt = Ingestor::new(Arc::new(objects), Arc::clone(&blobs))
        .ingest_object("b", "k.png")
        .await
        .unwrap();

    assert_eq!(receipt.size_bytes, 3);
    assert_eq!(receipt.total_chunks, 1);
}

proptest! {
    /// D1. Reassembly does not depend on the order items come back in
    #[test]
    fn prop_reassembly_is_order_independent(
        raw in proptest::collection::vec(any::<u8>(), 0..200),
        width in 1usize..40,
        seed in any::<u64>(),
    ) {
        let store = MemoryChunkStore::new();
        let blobs = ChunkedBlobs::new(store.clone(), ChunkConfig::new().with_chunk_size(width)).unwrap();
        let id = BlobId::from("p.bin");

        tokio_test::block_on(blobs.put_bytes("alice", &id, "application/octet-stream", &raw)).unwrap();
        let mut items = tokio_test::block_on(store.query_prefix("alice", "p.bin#")).unwrap();

        // deterministic shuffle
        let len = items.len();
        let mut state = seed | 1;
        for i in (1..len).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            items.swap(i, (state % (i as u64 + 1)) as usize);
        }

        let blob = reassemble(&id, items).unwrap();
        prop_assert_eq!(blob.decode().unwrap(), raw);
    }
}
