//! AWS KMS key provider
//!
//! Data keys come from `GenerateDataKey` (AES-256 key spec, 32 random
//! bytes); unwrapping uses `Decrypt`, which finds the master key from the
//! ciphertext blob itself.

use crate::error::{Error, Result};
use crate::keys::{GeneratedKey, KeyProvider};
use crate::security::DataKey;
use async_trait::async_trait;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::DataKeySpec;
use aws_sdk_kms::Client;
use tracing::debug;

/// Key provider backed by AWS KMS
#[derive(Clone)]
pub struct KmsKeyProvider {
    client: Client,
}

impl KmsKeyProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeyProvider for KmsKeyProvider {
    async fn generate_key(&self, master_key: &str) -> Result<GeneratedKey> {
        debug!("Generating data key under {}", master_key);

        let resp = self
            .client
            .generate_data_key()
            .key_id(master_key)
            .key_spec(DataKeySpec::Aes256)
            .send()
            .await
            .map_err(|e| {
                Error::key_service(format!(
                    "GenerateDataKey failed for {}: {}",
                    master_key,
                    DisplayErrorContext(&e)
                ))
            })?;

        let plaintext = resp
            .plaintext()
            .ok_or_else(|| Error::key_service("GenerateDataKey returned no plaintext"))?;
        let wrapped = resp
            .ciphertext_blob()
            .ok_or_else(|| Error::key_service("GenerateDataKey returned no ciphertext"))?;

        Ok(GeneratedKey {
            plaintext: DataKey::from_slice(plaintext.as_ref())?,
            wrapped: wrapped.as_ref().to_vec(),
        })
    }

    async fn unwrap_key(&self, wrapped: &[u8]) -> Result<DataKey> {
        debug!("Decrypting {} byte data key", wrapped.len());

        let resp = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(wrapped.to_vec()))
            .send()
            .await
            .map_err(|e| Error::key_service(format!("Decrypt failed: {}", DisplayErrorContext(&e))))?;

        let plaintext = resp
            .plaintext()
            .ok_or_else(|| Error::key_service("Decrypt returned no plaintext"))?;

        DataKey::from_slice(plaintext.as_ref())
    }
}

impl std::fmt::Debug for KmsKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmsKeyProvider").finish_non_exhaustive()
    }
}
