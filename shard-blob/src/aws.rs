use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Connection settings shared by the S3 and DynamoDB clients.
///
/// Unset fields fall back to the SDK's default provider chain, so in a
/// managed environment an empty `AwsSettings` is enough.
#[derive(Debug, Clone)]
pub struct AwsSettings {
    pub region: Option<String>,
    /// Custom endpoint, e.g. a local DynamoDB or an S3-compatible store
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub max_attempts: u32,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl AwsSettings {
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint_url<S: Into<String>>(mut self, url: S) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn with_static_credentials<A: Into<String>, S: Into<String>>(mut self, access_key_id: A, secret: S) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret.into());
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Resolve an [`SdkConfig`] from these settings
    pub async fn load(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::standard().with_max_attempts(self.max_attempts));

        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        if let (Some(key), Some(secret)) = (&self.access_key_id, &self.secret_access_key) {
            let credentials = Credentials::new(key.clone(), secret.clone(), None, None, "shard-static");
            loader = loader.credentials_provider(credentials);
        }

        loader.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempts_never_drop_below_one() {
        assert_eq!(AwsSettings::default().with_max_attempts(0).max_attempts, 1);
        assert_eq!(AwsSettings::default().max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn explicit_region_is_applied() {
        let sdk = AwsSettings::default()
            .with_region("eu-west-1")
            .with_static_credentials("AKID", "secret")
            .load()
            .await;
        assert_eq!(sdk.region().map(|r| r.as_ref()), Some("eu-west-1"));
    }
}
