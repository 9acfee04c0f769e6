//! In-memory object store
//!
//! Used by tests and offline runs. Listing pages by key order with a
//! configurable page size, and counts requests so that pagination and
//! early termination can be observed.

use crate::backend::{ListPage, ObjectStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

const DEFAULT_PAGE_SIZE: usize = 1000;

type ObjectKey = (String, String);

/// Object store held entirely in process memory
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<ObjectKey, Vec<u8>>>,
    page_size: usize,
    page_requests: AtomicUsize,
    put_requests: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create a store whose listings return at most `page_size` keys per page
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
            page_requests: AtomicUsize::new(0),
            put_requests: AtomicUsize::new(0),
        }
    }

    /// Number of `list_page` calls served so far
    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    /// Number of `put_object` calls served so far
    pub fn put_requests(&self) -> usize {
        self.put_requests.load(Ordering::SeqCst)
    }

    /// Read a raw object body, bypassing the request counters
    pub async fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Overwrite a raw object body, bypassing the request counters
    pub async fn replace_object(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), body);
    }

    /// Number of objects across all buckets
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.object(bucket, key).await)
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.put_requests.fetch_add(1, Ordering::SeqCst);
        self.replace_object(bucket, key, body).await;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);

        let objects = self.objects.read().await;
        let mut matching = objects
            .keys()
            .filter(|(b, key)| b == bucket && key.starts_with(prefix))
            .map(|(_, key)| key)
            .filter(|key| continuation.as_ref().is_none_or(|after| *key > after));

        let keys: Vec<String> = matching.by_ref().take(self.page_size).cloned().collect();
        let next = match (matching.next(), keys.last()) {
            (Some(_), Some(last)) => Some(last.clone()),
            _ => None,
        };

        Ok(ListPage { keys, next })
    }
}

impl std::fmt::Debug for MemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryObjectStore")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}
