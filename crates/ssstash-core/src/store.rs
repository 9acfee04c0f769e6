//! Secret store
//!
//! Orchestrates the full workflow:
//! - put: generate key -> seal -> write
//! - get: read -> unwrap key -> open
//! - delete and list go straight to the namespace

use crate::backend::ObjectStore;
use crate::encryption::EnvelopeCodec;
use crate::error::{Error, Result};
use crate::input::SecretInput;
use crate::keys::KeyProvider;
use crate::namespace::ObjectNamespace;
use crate::security::AuditLog;
use crate::types::Namespace;
use futures::{Stream, TryStreamExt};
use std::ops::ControlFlow;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;
use zeroize::Zeroizing;

/// Encrypted secret store
///
/// Combines a namespaced object store with envelope encryption.
pub struct SecretStore<S, K> {
    objects: ObjectNamespace<S>,
    codec: EnvelopeCodec<K>,
}

impl<S: ObjectStore, K: KeyProvider> SecretStore<S, K> {
    pub fn new(store: S, keys: K, namespace: Namespace) -> Self {
        Self {
            objects: ObjectNamespace::new(store, namespace),
            codec: EnvelopeCodec::new(keys),
        }
    }

    /// Get the namespace secrets are stored under
    pub fn namespace(&self) -> &Namespace {
        self.objects.namespace()
    }

    /// Get the underlying object store
    pub fn object_store(&self) -> &S {
        self.objects.store()
    }

    /// Get the key provider
    pub fn key_provider(&self) -> &K {
        self.codec.key_provider()
    }

    fn audit(&self, operation: &'static str, name: Option<&str>) -> AuditLog {
        AuditLog::new(operation, name, self.namespace().bucket())
    }

    /// Encrypt a secret and store it under `name`
    ///
    /// Fails with [`Error::MissingKey`] before any remote call when
    /// `master_key` is empty.
    pub async fn put(&self, name: &str, input: SecretInput, master_key: &str) -> Result<()> {
        let result = self.put_inner(name, input, master_key).await;
        self.audit("put", Some(name)).record(result)
    }

    async fn put_inner(&self, name: &str, input: SecretInput, master_key: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidName);
        }
        if master_key.is_empty() {
            return Err(Error::MissingKey);
        }

        let plaintext = input.read().await?;
        debug!("Sealing {} bytes for {}", plaintext.len(), name);

        let object = self.codec.seal(&plaintext, master_key).await?;
        self.objects.write(name, &object).await
    }

    /// Fetch and decrypt the secret stored under `name`
    pub async fn get(&self, name: &str) -> Result<Zeroizing<Vec<u8>>> {
        let result = self.get_inner(name).await;
        self.audit("get", Some(name)).record(result)
    }

    async fn get_inner(&self, name: &str) -> Result<Zeroizing<Vec<u8>>> {
        let object = self.objects.read(name).await?;
        self.codec.open(&object).await
    }

    /// Fetch a secret and write its bytes verbatim to `sink`
    pub async fn get_to<W>(&self, name: &str, sink: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let plaintext = self.get(name).await?;
        sink.write_all(&plaintext).await?;
        sink.flush().await?;
        Ok(())
    }

    /// Delete the secret stored under `name`; deleting an absent name succeeds
    pub async fn delete(&self, name: &str) -> Result<()> {
        let result = self.objects.delete(name).await;
        self.audit("delete", Some(name)).record(result)
    }

    /// Lazily enumerate the names of stored secrets
    pub fn list(&self) -> impl Stream<Item = Result<String>> + '_ {
        self.objects.list()
    }

    /// Call `visitor` for each stored name until it breaks
    ///
    /// Returning [`ControlFlow::Break`] stops enumeration without fetching
    /// further pages.
    pub async fn visit<F>(&self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&str) -> ControlFlow<()>,
    {
        let result = async {
            let mut names = std::pin::pin!(self.list());
            while let Some(name) = names.try_next().await? {
                if visitor(&name).is_break() {
                    debug!("Listing stopped by caller");
                    break;
                }
            }
            Ok::<(), Error>(())
        }
        .await;

        self.audit("list", None).record(result)
    }
}

impl<S, K> std::fmt::Debug for SecretStore<S, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore")
            .field("objects", &self.objects)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryObjectStore, MockObjectStore};
    use crate::keys::{MemoryKeyProvider, MockKeyProvider};

    fn create_test_store() -> SecretStore<MemoryObjectStore, MemoryKeyProvider> {
        SecretStore::new(
            MemoryObjectStore::new(),
            MemoryKeyProvider::new().with_master_key("key-1"),
            Namespace::new("my-bucket", "secrets"),
        )
    }

    #[tokio::test]
    async fn test_put_get() {
        let store = create_test_store();

        store
            .put("db-pass", SecretInput::literal("s3cr3t"), "key-1")
            .await
            .unwrap();

        let value = store.get("db-pass").await.unwrap();
        assert_eq!(value.as_slice(), b"s3cr3t");
    }

    #[tokio::test]
    async fn test_plaintext_never_stored() {
        let store = create_test_store();

        store
            .put("db-pass", SecretInput::literal("s3cr3t-marker"), "key-1")
            .await
            .unwrap();

        let body = store
            .object_store()
            .object("my-bucket", "secrets/db-pass")
            .await
            .unwrap();
        let body = String::from_utf8(body).unwrap();
        assert!(!body.contains("s3cr3t-marker"));
        assert!(body.contains("chacha20poly1305"));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = create_test_store();

        store
            .put("db-pass", SecretInput::literal("old"), "key-1")
            .await
            .unwrap();
        store
            .put("db-pass", SecretInput::literal("new"), "key-1")
            .await
            .unwrap();

        assert_eq!(store.get("db-pass").await.unwrap().as_slice(), b"new");
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_remote_calls() {
        let mut objects = MockObjectStore::new();
        objects.expect_put_object().never();
        let mut keys = MockKeyProvider::new();
        keys.expect_generate_key().never();

        let store = SecretStore::new(objects, keys, Namespace::new("my-bucket", ""));
        let result = store.put("db-pass", SecretInput::literal("v"), "").await;

        assert!(matches!(result, Err(Error::MissingKey)));
    }

    #[tokio::test]
    async fn test_missing_key_checked_before_reading_input() {
        let store = create_test_store();

        let result = store
            .put("db-pass", SecretInput::File("/nonexistent/path".into()), "")
            .await;
        assert!(matches!(result, Err(Error::MissingKey)));
    }

    #[tokio::test]
    async fn test_put_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("value");
        std::fs::write(&path, b"from-file\n").unwrap();

        let store = create_test_store();
        store
            .put("cert", SecretInput::File(path), "key-1")
            .await
            .unwrap();

        assert_eq!(store.get("cert").await.unwrap().as_slice(), b"from-file\n");
    }

    #[tokio::test]
    async fn test_get_to_writes_verbatim() {
        let store = create_test_store();
        store
            .put("db-pass", SecretInput::literal("no-newline"), "key-1")
            .await
            .unwrap();

        let mut sink = Vec::new();
        store.get_to("db-pass", &mut sink).await.unwrap();
        assert_eq!(sink, b"no-newline");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = create_test_store();

        let result = store.get("nope").await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(store.key_provider().unwrap_calls(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let mut objects = MockObjectStore::new();
        objects
            .expect_get_object()
            .returning(|_, _| Err(Error::storage("connection reset")));
        let store = SecretStore::new(
            objects,
            MemoryKeyProvider::new(),
            Namespace::new("my-bucket", ""),
        );

        assert!(matches!(store.get("x").await, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_write_uses_prefixed_key() {
        let mut objects = MockObjectStore::new();
        objects
            .expect_put_object()
            .withf(|bucket: &str, key: &str, _body: &Vec<u8>| {
                bucket == "my-bucket" && key == "team/db-pass"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let store = SecretStore::new(
            objects,
            MemoryKeyProvider::new().with_master_key("key-1"),
            Namespace::new("my-bucket", "team"),
        );

        store
            .put("db-pass", SecretInput::literal("v"), "key-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_visit_stops_on_break() {
        let store = SecretStore::new(
            MemoryObjectStore::with_page_size(1),
            MemoryKeyProvider::new().with_master_key("key-1"),
            Namespace::new("my-bucket", ""),
        );
        for name in ["a", "b", "c"] {
            store
                .put(name, SecretInput::literal("v"), "key-1")
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        store
            .visit(|name| {
                seen.push(name.to_string());
                ControlFlow::Break(())
            })
            .await
            .unwrap();

        assert_eq!(seen, vec!["a"]);
        assert_eq!(store.object_store().page_requests(), 1);
    }

    #[tokio::test]
    async fn test_visit_all() {
        let store = create_test_store();
        for name in ["a", "b"] {
            store
                .put(name, SecretInput::literal("v"), "key-1")
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        store
            .visit(|name| {
                seen.push(name.to_string());
                ControlFlow::Continue(())
            })
            .await
            .unwrap();

        seen.sort();
        assert_eq!(seen, vec!["a", "b"]);
    }
}
