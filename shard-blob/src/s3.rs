use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use tracing::debug;

use crate::{BlobError, BlobResult, FetchedObject, ObjectSource, UploadSigner};

/// S3 (or S3-compatible) access: object reads for ingestion, signed upload URLs
#[derive(Clone)]
pub struct S3ObjectSource {
    client: Client,
}

impl S3ObjectSource {
    /// `path_style` is needed by most S3-compatible stores behind a custom endpoint
    pub fn new(sdk_config: &aws_config::SdkConfig, path_style: bool) -> Self {
        let config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(path_style)
            .build();
        Self::from_client(Client::from_conf(config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectSource for S3ObjectSource {
    async fn fetch(&self, bucket: &str, key: &str) -> BlobResult<FetchedObject> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| BlobError::object_fetch(bucket, key, DisplayErrorContext(&e).to_string()))?;

        let content_type = output.content_type().map(str::to_string);
        let content_length = output.content_length().and_then(|len| u64::try_from(len).ok());
        let metadata = output.metadata().cloned().unwrap_or_default();

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| BlobError::object_fetch(bucket, key, e))?
            .into_bytes();
        debug!(bucket, key, len = bytes.len(), "fetched object");

        Ok(FetchedObject {
            bytes,
            content_type,
            content_length,
            metadata,
        })
    }
}

#[async_trait]
impl UploadSigner for S3ObjectSource {
    async fn sign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in_secs: u64,
    ) -> BlobResult<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expires_in_secs))
            .map_err(|e| BlobError::signing(key, e))?;

        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| BlobError::signing(key, DisplayErrorContext(&e).to_string()))?;

        Ok(request.uri().to_string())
    }
}
