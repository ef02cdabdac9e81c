use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shard_blob::BlobError;
use shard_core::errors::ShardError;
use tracing::error;

#[derive(Debug)]
pub struct ShardAxumError(pub anyhow::Error);

impl From<anyhow::Error> for ShardAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<ShardError> for ShardAxumError {
    fn from(e: ShardError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<BlobError> for ShardAxumError {
    fn from(e: BlobError) -> Self {
        Self(shard_error(e).into_anyhow())
    }
}

/// Map a storage error onto an HTTP-facing kind.
///
/// Backend failures carry SDK detail that stays in the logs; clients only
/// see a generic message for them.
pub fn shard_error(err: BlobError) -> ShardError {
    let message = err.to_string();
    match err {
        BlobError::NotFound { .. } => ShardError::not_found(message),
        BlobError::Invalid { .. } | BlobError::Decode { .. } | BlobError::MalformedEvent { .. } => {
            ShardError::bad_request(message)
        }
        BlobError::Unsupported { .. } => ShardError::not_implemented(message),
        BlobError::CorruptBlob { .. } => {
            error!(error = %message, "serving corrupt blob failed");
            ShardError::general_error(message)
        }
        backend => {
            error!(error = %message, "storage backend failed");
            ShardError::general_error("Storage backend error").with_source(backend.into())
        }
    }
}

impl IntoResponse for ShardAxumError {
    fn into_response(self) -> Response {
        // If it's a ShardError (even if wrapped by anyhow contexts), preserve Feathers-ish fields
        if let Some(shard) = self.0.chain().find_map(|e| e.downcast_ref::<ShardError>()) {
            let safe = shard.sanitize_for_client();
            let status = StatusCode::from_u16(safe.code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, Json(safe.to_json())).into_response();
        }

        // Fallback: wrap any other error as a GeneralError
        let shard = ShardError::general_error(self.0.to_string());
        let safe = shard.sanitize_for_client();
        let status = StatusCode::from_u16(safe.code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
