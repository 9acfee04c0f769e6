//! Secret storage types
//!
//! The namespace that maps secret names to object keys, and the
//! self-describing envelope persisted for every secret.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Current envelope format version
pub const ENVELOPE_VERSION: u32 = 1;

/// Separator appended to non-empty prefixes
const PREFIX_SEPARATOR: char = '/';

/// A bucket and key prefix under which secrets live
///
/// The prefix always ends with `/` unless it is empty, so that
/// `strip(storage_key(name)) == Some(name)` for every name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    bucket: String,
    prefix: String,
}

impl Namespace {
    /// Create a namespace, normalizing the prefix
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with(PREFIX_SEPARATOR) {
            prefix.push(PREFIX_SEPARATOR);
        }

        Self {
            bucket: bucket.into(),
            prefix,
        }
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Get the normalized key prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build the object key for a secret name
    pub fn storage_key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Recover the secret name from an object key
    ///
    /// Returns `None` for keys outside this namespace.
    pub fn strip<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.prefix)
    }
}

/// Data encryption algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionAlgorithm {
    /// ChaCha20-Poly1305 AEAD with a 256-bit key
    #[default]
    ChaCha20Poly1305,
}

impl EncryptionAlgorithm {
    /// Identifier written into envelopes
    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionAlgorithm::ChaCha20Poly1305 => "chacha20poly1305",
        }
    }
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncryptionAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chacha20poly1305" => Ok(EncryptionAlgorithm::ChaCha20Poly1305),
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// The durable representation of one secret
///
/// `algorithm` is kept as the raw identifier read from storage so that
/// envelopes written by newer releases are rejected on open rather than on
/// parse.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedObject {
    pub algorithm: String,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
    pub wrapped_key: Vec<u8>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

/// JSON body stored in the bucket
#[derive(Debug, Serialize, Deserialize)]
struct StoredEnvelope {
    version: u32,
    algorithm: String,
    nonce: String,
    ciphertext: String,
    tag: String,
    wrapped_key: String,
    created_at: String,
}

impl EncryptedObject {
    /// Serialize to the JSON body written to storage
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let stored = StoredEnvelope {
            version: ENVELOPE_VERSION,
            algorithm: self.algorithm.clone(),
            nonce: BASE64.encode(&self.nonce),
            ciphertext: BASE64.encode(&self.ciphertext),
            tag: BASE64.encode(&self.tag),
            wrapped_key: BASE64.encode(&self.wrapped_key),
            created_at: self.created_at.clone(),
        };

        serde_json::to_vec_pretty(&stored)
            .map_err(|e| Error::storage(format!("Failed to serialize envelope: {}", e)))
    }

    /// Parse a JSON body read from storage
    ///
    /// A body that does not decode is treated as corruption.
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        let stored: StoredEnvelope = serde_json::from_slice(body)
            .map_err(|e| Error::integrity(format!("malformed envelope: {}", e)))?;

        if stored.version != ENVELOPE_VERSION {
            return Err(Error::UnsupportedAlgorithm(format!(
                "envelope version {}",
                stored.version
            )));
        }

        Ok(Self {
            algorithm: stored.algorithm,
            nonce: decode_field("nonce", &stored.nonce)?,
            ciphertext: decode_field("ciphertext", &stored.ciphertext)?,
            tag: decode_field("tag", &stored.tag)?,
            wrapped_key: decode_field("wrapped_key", &stored.wrapped_key)?,
            created_at: stored.created_at,
        })
    }
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|e| Error::integrity(format!("malformed {}: {}", field, e)))
}

impl fmt::Debug for EncryptedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedObject")
            .field("algorithm", &self.algorithm)
            .field("ciphertext_len", &self.ciphertext.len())
            .field("wrapped_key_len", &self.wrapped_key.len())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
