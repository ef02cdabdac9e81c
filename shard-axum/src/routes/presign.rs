use axum::{extract::State, Json};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shard_core::ShardError;
use tracing::info;

use crate::{ImagesState, ShardAxumError};

pub const UPLOAD_KEY_PREFIX: &str = "uploads/";
pub const DEFAULT_UPLOAD_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PresignResponse {
    pub url: String,
    pub key: String,
    pub expires: u64,
}

/// Object key for an upload; a missing or blank filename gets a random one
pub fn upload_key(filename: Option<&str>) -> String {
    match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(name) => format!("{UPLOAD_KEY_PREFIX}{name}"),
        None => format!("{UPLOAD_KEY_PREFIX}{}.png", uuid::Uuid::new_v4().simple()),
    }
}

/// The body is optional: an empty body means "pick everything for me".
pub async fn presign(
    State(state): State<ImagesState>,
    body: Bytes,
) -> Result<Json<PresignResponse>, ShardAxumError> {
    let request: PresignRequest = if body.iter().all(u8::is_ascii_whitespace) {
        PresignRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            ShardError::bad_request("Failed to parse the request body as JSON")
                .with_data(json!({"_schema": [e.to_string()]}))
        })?
    };

    let Some(signer) = state.signer.as_ref() else {
        return Err(ShardError::not_implemented("Upload presigning is not configured").into());
    };

    let key = upload_key(request.filename.as_deref());
    let content_type = request
        .content_type
        .as_deref()
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_UPLOAD_CONTENT_TYPE);

    let url = signer
        .sign_put(&state.uploads_bucket, &key, content_type, state.presign_expires)
        .await?;
    info!(bucket = %state.uploads_bucket, %key, "issued upload url");

    Ok(Json(PresignResponse {
        url,
        key,
        expires: state.presign_expires,
    }))
}
