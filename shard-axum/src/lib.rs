//! shard-axum: HTTP surface for chunked image storage.
//!
//! Routes:
//! - `GET /health`
//! - `POST /presign` issues a signed upload URL under `uploads/`
//! - `GET /images?limit=N` lists stored blobs
//! - `GET /images/{blobId}` returns `{contentType, base64}`
//! - `GET /images/{blobId}/raw` returns the decoded bytes
//!
//! Reads are served from the partition named by the `x-owner-id` header or
//! the `owner` query parameter, falling back to the default owner.

pub mod app;
pub mod params;
pub mod routes;
pub mod state;
mod error;
pub use error::{shard_error, ShardAxumError};
pub use state::ImagesState;

pub use app::{axum, AxumApp};
