use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during chunked blob operations
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {blob_id}")]
    NotFound { blob_id: String },

    /// Metadata and chunk records disagree. Never repaired automatically.
    #[error("Corrupt blob {blob_id}: {reason}")]
    CorruptBlob { blob_id: String, reason: String },

    #[error("Store write failed for {target}: {source}")]
    StoreWrite {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("Store read failed: {source}")]
    StoreRead {
        #[source]
        source: BoxError,
    },

    #[error("Malformed event record: {reason}")]
    MalformedEvent { reason: String },

    #[error("Failed to fetch s3://{bucket}/{key}: {source}")]
    ObjectFetch {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to sign upload for {key}: {source}")]
    Signing {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Operation not supported: {message}")]
    Unsupported { message: String },

    #[error("Encoded payload is not valid base64: {source}")]
    Decode {
        #[from]
        source: base64::DecodeError,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl BlobError {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(blob_id: S) -> Self {
        Self::NotFound {
            blob_id: blob_id.into(),
        }
    }

    /// Create a corrupt blob error
    pub fn corrupt<S: Into<String>, R: Into<String>>(blob_id: S, reason: R) -> Self {
        Self::CorruptBlob {
            blob_id: blob_id.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a failed put into a store write error naming the item(s) affected
    pub fn store_write<T, E>(target: T, error: E) -> Self
    where
        T: Into<String>,
        E: Into<BoxError>,
    {
        Self::StoreWrite {
            target: target.into(),
            source: error.into(),
        }
    }

    /// Wrap a failed query or scan
    pub fn store_read<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::StoreRead {
            source: error.into(),
        }
    }

    pub fn malformed_event<S: Into<String>>(reason: S) -> Self {
        Self::MalformedEvent {
            reason: reason.into(),
        }
    }

    pub fn object_fetch<B, K, E>(bucket: B, key: K, error: E) -> Self
    where
        B: Into<String>,
        K: Into<String>,
        E: Into<BoxError>,
    {
        Self::ObjectFetch {
            bucket: bucket.into(),
            key: key.into(),
            source: error.into(),
        }
    }

    pub fn signing<K, E>(key: K, error: E) -> Self
    where
        K: Into<String>,
        E: Into<BoxError>,
    {
        Self::Signing {
            key: key.into(),
            source: error.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// True for errors a client caused, as opposed to storage-side failures
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Invalid { .. } | Self::Decode { .. } | Self::MalformedEvent { .. }
        )
    }
}
