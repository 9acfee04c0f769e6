//! Encrypted secret storage for ssstash
//!
//! This crate stores named secrets in S3 with client-side envelope
//! encryption:
//! - **Key management**: a fresh data key per secret from AWS KMS
//! - **Encryption**: ChaCha20-Poly1305 with a detached tag
//! - **Storage**: one JSON envelope per secret under a bucket prefix
//! - **Security**: zeroized key and plaintext buffers, audit logging
//!
//! ## Usage
//!
//! ```ignore
//! use ssstash_core::{config, SecretInput, StoreConfig};
//!
//! let config = StoreConfig::new("my-secrets").with_prefix("prod");
//! let store = config::open_store(&config).await?;
//!
//! store.put("db-pass", SecretInput::parse("s3cr3t"), "alias/ssstash").await?;
//! let value = store.get("db-pass").await?;
//! ```

pub mod backend;
pub mod config;
pub mod encryption;
pub mod error;
pub mod input;
pub mod keys;
pub mod namespace;
pub mod security;
pub mod store;
pub mod types;

// Re-export commonly used items
pub use backend::{ListPage, MemoryObjectStore, ObjectStore, S3ObjectStore};
pub use config::{open_store, StoreConfig};
pub use encryption::EnvelopeCodec;
pub use error::{Error, Result};
pub use input::SecretInput;
pub use keys::{GeneratedKey, KeyProvider, KmsKeyProvider, MemoryKeyProvider};
pub use namespace::ObjectNamespace;
pub use security::{AuditLog, DataKey};
pub use store::SecretStore;
pub use types::{EncryptedObject, EncryptionAlgorithm, Namespace};
