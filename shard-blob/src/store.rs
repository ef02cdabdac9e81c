use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::{BlobResult, FetchedObject};

/// Partition key attribute name in the images table
pub const PARTITION_KEY_ATTR: &str = "userId";

/// Sort key attribute name in the images table
pub const SORT_KEY_ATTR: &str = "sk";

/// Attribute value as persisted by a key-value store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    S(String),
    N(u64),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::S(s) => Some(s),
            AttrValue::N(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AttrValue::N(n) => Some(*n),
            AttrValue::S(s) => s.parse().ok(),
        }
    }
}

/// Primary key of a stored item
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    pub partition_key: String,
    pub sort_key: String,
}

/// One item in the key-value store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub key: ItemKey,
    pub attributes: BTreeMap<String, AttrValue>,
}

impl StoredItem {
    pub fn new<P: Into<String>, S: Into<String>>(partition_key: P, sort_key: S) -> Self {
        Self {
            key: ItemKey {
                partition_key: partition_key.into(),
                sort_key: sort_key.into(),
            },
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_string<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.attributes.insert(name.into(), AttrValue::S(value.into()));
        self
    }

    pub fn with_number<K: Into<String>>(mut self, name: K, value: u64) -> Self {
        self.attributes.insert(name.into(), AttrValue::N(value));
        self
    }

    pub fn partition_key(&self) -> &str {
        &self.key.partition_key
    }

    pub fn sort_key(&self) -> &str {
        &self.key.sort_key
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(AttrValue::as_str)
    }

    pub fn number(&self, name: &str) -> Option<u64> {
        self.attributes.get(name).and_then(AttrValue::as_u64)
    }

    /// Copy keeping only the named attributes (keys are always kept)
    pub fn project(&self, names: &[String]) -> StoredItem {
        StoredItem {
            key: self.key.clone(),
            attributes: self
                .attributes
                .iter()
                .filter(|(name, _)| names.iter().any(|n| n == *name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }
}

/// Full-table enumeration request
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    /// Attributes to return besides the key; `None` returns everything
    pub projection: Option<Vec<String>>,
    /// Maximum items evaluated in this page
    pub limit: Option<usize>,
    /// Resume after this key (from a previous page's `next`)
    pub start_after: Option<ItemKey>,
}

impl ScanRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projection<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn starting_after(mut self, key: Option<ItemKey>) -> Self {
        self.start_after = key;
        self
    }
}

/// One page of scan results
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<StoredItem>,
    /// Key to resume from; `None` once the table is exhausted
    pub next: Option<ItemKey>,
}

/// Key-value storage for metadata and chunk items.
///
/// Items are addressed by (partition key, sort key). No operation is
/// transactional across items.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Create or overwrite one item
    async fn put_item(&self, item: StoredItem) -> BlobResult<()>;

    /// Create or overwrite several items. Not atomic: on failure some items
    /// may already be stored.
    async fn put_batch(&self, items: Vec<StoredItem>) -> BlobResult<()>;

    /// All items in `partition_key` whose sort key starts with `sort_key_prefix`,
    /// in ascending sort key order
    async fn query_prefix(
        &self,
        partition_key: &str,
        sort_key_prefix: &str,
    ) -> BlobResult<Vec<StoredItem>>;

    /// Enumerate the whole table one page at a time
    async fn scan(&self, request: ScanRequest) -> BlobResult<ScanPage>;
}

/// Read access to the object store that receives uploads
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Fetch an object and read its body fully
    async fn fetch(&self, bucket: &str, key: &str) -> BlobResult<FetchedObject>;
}

/// Issues time-limited upload URLs
#[async_trait]
pub trait UploadSigner: Send + Sync {
    /// Generate a signed URL for writing
    async fn sign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in_secs: u64,
    ) -> BlobResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_keeps_keys_and_named_attributes() {
        let item = StoredItem::new("alice", "cat#CHUNK#0001")
            .with_number("chunkIndex", 0)
            .with_string("data", "QUJD");

        let projected = item.project(&["chunkIndex".to_string()]);
        assert_eq!(projected.sort_key(), "cat#CHUNK#0001");
        assert_eq!(projected.number("chunkIndex"), Some(0));
        assert!(projected.string("data").is_none());
    }

    #[test]
    fn numbers_stored_as_strings_still_parse() {
        let item = StoredItem::new("alice", "cat#META").with_string("sizeBytes", "42");
        assert_eq!(item.number("sizeBytes"), Some(42));
        assert_eq!(item.string("missing"), None);
    }
}
