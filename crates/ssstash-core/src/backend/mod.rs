//! Object storage backends
//!
//! Backends deal in raw object keys and bodies; mapping secret names to keys
//! is the job of [`crate::namespace::ObjectNamespace`].

pub mod memory;
pub mod s3;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// One page of a prefix listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Object keys in this page, in backend order
    pub keys: Vec<String>,
    /// Continuation token for the next page, `None` on the last page
    pub next: Option<String>,
}

/// Trait for object storage backends
///
/// `delete_object` must succeed for keys that do not exist.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object body, `None` if the key does not exist
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store an object body, replacing any existing object
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;

    /// Remove an object
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Fetch one page of keys starting with `prefix`
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage>;
}

#[async_trait]
impl<T> ObjectStore for Arc<T>
where
    T: ObjectStore + ?Sized,
{
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get_object(bucket, key).await
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        (**self).put_object(bucket, key, body).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        (**self).delete_object(bucket, key).await
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage> {
        (**self).list_page(bucket, prefix, continuation).await
    }
}
