//! Store configuration and AWS client construction

use crate::backend::S3ObjectStore;
use crate::error::{Error, Result};
use crate::keys::KmsKeyProvider;
use crate::store::SecretStore;
use crate::types::Namespace;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where secrets live and how to reach AWS
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// S3 bucket name
    pub bucket: String,
    /// Key prefix for secrets (e.g., "team/prod")
    #[serde(default)]
    pub prefix: String,
    /// Named profile from the shared AWS credentials file
    #[serde(default)]
    pub profile: Option<String>,
    /// AWS region (defaults to the provider chain)
    #[serde(default)]
    pub region: Option<String>,
    /// Custom S3-compatible endpoint (optional)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Custom KMS endpoint (optional)
    #[serde(default)]
    pub kms_endpoint: Option<String>,
}

impl StoreConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Check that required settings are present
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::config("S3 bucket is not specified"));
        }
        Ok(())
    }

    /// Build the namespace with a normalized prefix
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.bucket.clone(), self.prefix.clone())
    }
}

/// AWS clients shared by the store
#[derive(Debug, Clone)]
pub struct AwsClients {
    pub s3: aws_sdk_s3::Client,
    pub kms: aws_sdk_kms::Client,
}

/// Load the shared AWS configuration and build S3 and KMS clients
///
/// Credentials are resolved lazily by the SDK on first request.
pub async fn connect(config: &StoreConfig) -> Result<AwsClients> {
    config.validate()?;

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = config.profile.as_deref() {
        debug!("Using AWS profile: {}", profile);
        loader = loader.profile_name(profile);
    }
    if let Some(region) = config.region.as_deref() {
        loader = loader.region(Region::new(region.to_string()));
    }
    let sdk_config = loader.load().await;

    let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);
    // Configure custom endpoint for S3-compatible storage
    if let Some(endpoint_url) = config.endpoint.as_deref() {
        debug!("Using custom S3 endpoint: {}", endpoint_url);
        s3_config_builder = s3_config_builder
            .endpoint_url(endpoint_url)
            .force_path_style(true); // Required for MinIO and many S3-compatible services
    }

    let mut kms_config_builder = aws_sdk_kms::config::Builder::from(&sdk_config);
    if let Some(endpoint_url) = config.kms_endpoint.as_deref() {
        debug!("Using custom KMS endpoint: {}", endpoint_url);
        kms_config_builder = kms_config_builder.endpoint_url(endpoint_url);
    }

    Ok(AwsClients {
        s3: aws_sdk_s3::Client::from_conf(s3_config_builder.build()),
        kms: aws_sdk_kms::Client::from_conf(kms_config_builder.build()),
    })
}

/// Build a store backed by S3 and KMS
pub async fn open_store(config: &StoreConfig) -> Result<SecretStore<S3ObjectStore, KmsKeyProvider>> {
    let clients = connect(config).await?;
    Ok(SecretStore::new(
        S3ObjectStore::new(clients.s3),
        KmsKeyProvider::new(clients.kms),
        config.namespace(),
    ))
}
