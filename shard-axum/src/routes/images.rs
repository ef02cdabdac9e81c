use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shard_blob::{BlobId, BlobSummary};
use shard_core::ShardError;
use tracing::debug;

use crate::{params::OwnerId, ImagesState, ShardAxumError};

pub const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// Body of `GET /images/{blobId}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBody {
    pub content_type: String,
    pub base64: String,
}

fn map_query_rejection(rejection: QueryRejection) -> ShardAxumError {
    ShardError::bad_request(format!("Invalid query string: {rejection}")).into()
}

pub async fn list(
    State(state): State<ImagesState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<BlobSummary>>, ShardAxumError> {
    let Query(query) = query.map_err(map_query_rejection)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let summaries = state.blobs.list(limit).await?;
    Ok(Json(summaries))
}

pub async fn get_encoded(
    State(state): State<ImagesState>,
    OwnerId(owner): OwnerId,
    Path(blob_id): Path<String>,
) -> Result<Json<ImageBody>, ShardAxumError> {
    let blob_id = BlobId::from_string(blob_id);
    debug!(%owner, %blob_id, "reading image");

    let blob = state.blobs.read(&owner, &blob_id).await?;
    Ok(Json(ImageBody {
        content_type: blob.content_type,
        base64: blob.encoded_text,
    }))
}

pub async fn get_raw(
    State(state): State<ImagesState>,
    OwnerId(owner): OwnerId,
    Path(blob_id): Path<String>,
) -> Result<impl IntoResponse, ShardAxumError> {
    let blob_id = BlobId::from_string(blob_id);
    let (content_type, bytes) = state.blobs.read_bytes(&owner, &blob_id).await?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
