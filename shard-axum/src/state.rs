use std::sync::Arc;

use shard_blob::{ChunkedBlobs, UploadSigner};

pub const DEFAULT_PRESIGN_EXPIRES_SECS: u64 = 300;

/// Everything the HTTP handlers need, shared across requests
#[derive(Clone)]
pub struct ImagesState {
    pub blobs: Arc<ChunkedBlobs>,
    /// `None` disables `/presign`
    pub signer: Option<Arc<dyn UploadSigner>>,
    pub uploads_bucket: String,
    pub presign_expires: u64,
}

impl ImagesState {
    pub fn new(blobs: Arc<ChunkedBlobs>) -> Self {
        Self {
            blobs,
            signer: None,
            uploads_bucket: String::new(),
            presign_expires: DEFAULT_PRESIGN_EXPIRES_SECS,
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn UploadSigner>, bucket: impl Into<String>) -> Self {
        self.signer = Some(signer);
        self.uploads_bucket = bucket.into();
        self
    }

    pub fn with_presign_expires(mut self, secs: u64) -> Self {
        self.presign_expires = secs;
        self
    }

    pub fn default_owner(&self) -> &str {
        &self.blobs.config().default_owner
    }
}
