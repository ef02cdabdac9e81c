use crate::BlobId;

/// Separator that replaces `/` in object keys
pub const PATH_SEPARATOR_TOKEN: &str = "__";

/// Flatten an object-store key into a blob identifier.
///
/// `uploads/2024/cat.png` becomes `uploads__2024__cat.png`. Keys that already
/// contain `__` where another key has `/` collide; that is accepted.
pub fn derive_blob_id(source_key: &str) -> BlobId {
    BlobId(source_key.replace('/', PATH_SEPARATOR_TOKEN))
}
