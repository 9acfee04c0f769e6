//! Data key providers
//!
//! A [`KeyProvider`] mints a fresh data key wrapped under a master key, and
//! unwraps previously wrapped keys. The master key is recovered by the
//! provider from the wrapped material, so callers never pass it on unwrap.

pub mod kms;
pub mod memory;

use crate::error::Result;
use crate::security::DataKey;
use async_trait::async_trait;
use std::sync::Arc;

pub use kms::KmsKeyProvider;
pub use memory::MemoryKeyProvider;

/// A freshly generated data key in both plaintext and wrapped form
#[derive(Debug)]
pub struct GeneratedKey {
    pub plaintext: DataKey,
    pub wrapped: Vec<u8>,
}

/// Trait for key-management services
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Generate a new data key wrapped under `master_key`
    async fn generate_key(&self, master_key: &str) -> Result<GeneratedKey>;

    /// Recover the plaintext of a wrapped data key
    async fn unwrap_key(&self, wrapped: &[u8]) -> Result<DataKey>;
}

#[async_trait]
impl<T> KeyProvider for Arc<T>
where
    T: KeyProvider + ?Sized,
{
    async fn generate_key(&self, master_key: &str) -> Result<GeneratedKey> {
        (**self).generate_key(master_key).await
    }

    async fn unwrap_key(&self, wrapped: &[u8]) -> Result<DataKey> {
        (**self).unwrap_key(wrapped).await
    }
}
