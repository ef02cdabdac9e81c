use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    BlobError, BlobResult, ChunkStore, FetchedObject, ItemKey, ObjectSource, ScanPage,
    ScanRequest, StoredItem,
};

/// In-memory key-value store for testing and development.
///
/// Items are kept in key order, so queries and scans return them sorted the
/// way DynamoDB returns a single partition.
#[derive(Clone, Default)]
pub struct MemoryChunkStore {
    items: Arc<RwLock<BTreeMap<ItemKey, StoredItem>>>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Remove one item, e.g. to simulate a lost chunk write
    pub fn remove(&self, partition_key: &str, sort_key: &str) -> Option<StoredItem> {
        self.items.write().remove(&ItemKey {
            partition_key: partition_key.to_string(),
            sort_key: sort_key.to_string(),
        })
    }

    pub fn keys(&self) -> Vec<ItemKey> {
        self.items.read().keys().cloned().collect()
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn put_item(&self, item: StoredItem) -> BlobResult<()> {
        self.items.write().insert(item.key.clone(), item);
        Ok(())
    }

    async fn put_batch(&self, items: Vec<StoredItem>) -> BlobResult<()> {
        let mut stored = self.items.write();
        for item in items {
            stored.insert(item.key.clone(), item);
        }
        Ok(())
    }

    async fn query_prefix(
        &self,
        partition_key: &str,
        sort_key_prefix: &str,
    ) -> BlobResult<Vec<StoredItem>> {
        let start = ItemKey {
            partition_key: partition_key.to_string(),
            sort_key: sort_key_prefix.to_string(),
        };

        let items = self.items.read();
        Ok(items
            .range(start..)
            .take_while(|(key, _)| {
                key.partition_key == partition_key && key.sort_key.starts_with(sort_key_prefix)
            })
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn scan(&self, request: ScanRequest) -> BlobResult<ScanPage> {
        if request.limit == Some(0) {
            return Err(BlobError::invalid("scan limit must be positive"));
        }

        let items = self.items.read();
        let lower = match &request.start_after {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Unbounded,
        };
        let limit = request.limit.unwrap_or(usize::MAX);

        let page: Vec<StoredItem> = items
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, item)| match &request.projection {
                Some(names) => item.project(names),
                None => item.clone(),
            })
            .collect();

        let next = match page.last() {
            Some(last) if page.len() == limit => {
                let more = items
                    .range((Bound::Excluded(last.key.clone()), Bound::Unbounded))
                    .next()
                    .is_some();
                more.then(|| last.key.clone())
            }
            _ => None,
        };

        Ok(ScanPage { items: page, next })
    }
}

/// In-memory object store keyed by (bucket, key)
#[derive(Clone, Default)]
pub struct MemoryObjectSource {
    objects: Arc<RwLock<HashMap<(String, String), FetchedObject>>>,
}

impl MemoryObjectSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<B: Into<String>, K: Into<String>>(&self, bucket: B, key: K, object: FetchedObject) {
        self.objects.write().insert((bucket.into(), key.into()), object);
    }
}

#[async_trait]
impl ObjectSource for MemoryObjectSource {
    async fn fetch(&self, bucket: &str, key: &str) -> BlobResult<FetchedObject> {
        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| BlobError::object_fetch(bucket, key, "NoSuchKey"))
    }
}
