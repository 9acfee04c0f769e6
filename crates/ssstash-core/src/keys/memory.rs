//! In-process key provider
//!
//! Stands in for a key-management service in tests and offline runs. Master
//! keys live in memory; a wrapped data key carries the master key reference
//! so that unwrapping needs only the blob, as with KMS.
//!
//! Wrapped layout: `u16 id length (BE) | id | 12-byte nonce | sealed key`.

use crate::error::{Error, Result};
use crate::keys::{GeneratedKey, KeyProvider};
use crate::security::DataKey;
use async_trait::async_trait;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use zeroize::Zeroizing;

const NONCE_LEN: usize = 12;

/// Key provider holding master keys in process memory
#[derive(Default)]
pub struct MemoryKeyProvider {
    master_keys: HashMap<String, DataKey>,
    generate_calls: AtomicUsize,
    unwrap_calls: AtomicUsize,
}

impl MemoryKeyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a master key under `key_id` with random key material
    pub fn with_master_key(mut self, key_id: impl Into<String>) -> Self {
        self.master_keys.insert(key_id.into(), DataKey::generate());
        self
    }

    /// Number of `generate_key` calls served so far
    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    /// Number of `unwrap_key` calls served so far
    pub fn unwrap_calls(&self) -> usize {
        self.unwrap_calls.load(Ordering::SeqCst)
    }

    fn master_key(&self, key_id: &str) -> Result<&DataKey> {
        self.master_keys
            .get(key_id)
            .ok_or_else(|| Error::key_service(format!("Unknown master key: {}", key_id)))
    }

    fn wrap(&self, key_id: &str, data_key: &DataKey) -> Result<Vec<u8>> {
        let master = self.master_key(key_id)?;
        let id_len = u16::try_from(key_id.len())
            .map_err(|_| Error::key_service("Master key reference too long"))?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(master.expose()));
        let sealed = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: data_key.expose(),
                    aad: key_id.as_bytes(),
                },
            )
            .map_err(|e| Error::key_service(format!("Failed to wrap data key: {}", e)))?;

        let mut wrapped = Vec::with_capacity(2 + key_id.len() + NONCE_LEN + sealed.len());
        wrapped.extend_from_slice(&id_len.to_be_bytes());
        wrapped.extend_from_slice(key_id.as_bytes());
        wrapped.extend_from_slice(&nonce);
        wrapped.extend_from_slice(&sealed);
        Ok(wrapped)
    }

    fn unwrap(&self, wrapped: &[u8]) -> Result<DataKey> {
        let malformed = || Error::key_service("Malformed wrapped key");

        let (len_bytes, rest) = wrapped.split_at_checked(2).ok_or_else(malformed)?;
        let id_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        let (id_bytes, rest) = rest.split_at_checked(id_len).ok_or_else(malformed)?;
        let (nonce, sealed) = rest.split_at_checked(NONCE_LEN).ok_or_else(malformed)?;

        let key_id = std::str::from_utf8(id_bytes).map_err(|_| malformed())?;
        let master = self.master_key(key_id)?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(master.expose()));
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: id_bytes,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| Error::key_service("Wrapped key rejected by key service"))?;

        DataKey::from_slice(&plaintext)
    }
}

#[async_trait]
impl KeyProvider for MemoryKeyProvider {
    async fn generate_key(&self, master_key: &str) -> Result<GeneratedKey> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);

        let plaintext = DataKey::generate();
        let wrapped = self.wrap(master_key, &plaintext)?;
        Ok(GeneratedKey { plaintext, wrapped })
    }

    async fn unwrap_key(&self, wrapped: &[u8]) -> Result<DataKey> {
        self.unwrap_calls.fetch_add(1, Ordering::SeqCst);
        self.unwrap(wrapped)
    }
}

impl std::fmt::Debug for MemoryKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut key_ids: Vec<&str> = self.master_keys.keys().map(String::as_str).collect();
        key_ids.sort_unstable();
        f.debug_struct("MemoryKeyProvider")
            .field("master_keys", &key_ids)
            .finish_non_exhaustive()
    }
}
