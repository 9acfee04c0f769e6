//! S3 object store
//!
//! Supports AWS S3 and S3-compatible storage (MinIO, LocalStack) through a
//! custom endpoint configured on the client.

use crate::backend::{ListPage, ObjectStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use aws_sdk_s3::Client;
use tracing::debug;

/// S3 backend for envelope objects
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        debug!("Downloading object: s3://{}/{}", bucket, key);

        let resp = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    debug!("Object does not exist: s3://{}/{}", bucket, key);
                    return Ok(None);
                }
                return Err(Error::storage(format!(
                    "Failed to get s3://{}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&service_error)
                )));
            }
        };

        let body = resp.body.collect().await.map_err(|e| {
            Error::storage(format!("Failed to read s3://{}/{}: {}", bucket, key, e))
        })?;

        let data = body.into_bytes().to_vec();
        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), bucket, key);
        Ok(Some(data))
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        debug!("Uploading object ({} bytes): s3://{}/{}", body.len(), bucket, key);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .server_side_encryption(ServerSideEncryption::Aes256) // SSE-S3
            .send()
            .await
            .map_err(|e| {
                Error::storage(format!(
                    "Failed to put s3://{}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        debug!("Deleting object: s3://{}/{}", bucket, key);

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                Error::storage(format!(
                    "Failed to delete s3://{}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage> {
        debug!("Listing page of s3://{}/{}", bucket, prefix);

        let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }

        let resp = request.send().await.map_err(|e| {
            Error::storage(format!(
                "Failed to list s3://{}/{}: {}",
                bucket,
                prefix,
                DisplayErrorContext(&e)
            ))
        })?;

        let keys = resp
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| object.key)
            .collect();

        let next = if resp.is_truncated == Some(true) {
            resp.next_continuation_token
        } else {
            None
        };

        Ok(ListPage { keys, next })
    }
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore").finish_non_exhaustive()
    }
}
