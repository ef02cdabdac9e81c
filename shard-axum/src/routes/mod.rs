pub mod images;
pub mod presign;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::ImagesState;

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub fn router(state: ImagesState) -> Router<()> {
    Router::new()
        .route("/health", get(health))
        .route("/presign", post(presign::presign))
        .route("/images", get(images::list))
        .route("/images/{blob_id}", get(images::get_encoded))
        .route("/images/{blob_id}/raw", get(images::get_raw))
        .with_state(state)
}
