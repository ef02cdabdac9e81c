use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;

use crate::ImagesState;

pub const OWNER_HEADER: &str = "x-owner-id";
pub const OWNER_QUERY: &str = "owner";

/// Partition a read is served from: the `x-owner-id` header, else the
/// `owner` query parameter, else the configured default owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn from_parts(parts: &Parts, default_owner: &str) -> Self {
        let from_header = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let owner = from_header.or_else(|| {
            Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(mut query)| query.remove(OWNER_QUERY))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        });

        Self(owner.unwrap_or_else(|| default_owner.to_string()))
    }
}

impl FromRequestParts<ImagesState> for OwnerId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &ImagesState) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts, state.default_owner()))
    }
}
