//! Error types for ssstash-core

use thiserror::Error;

/// Result type alias using ssstash-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by the secret store
#[derive(Error, Debug)]
pub enum Error {
    /// `put` was called without a master key reference
    #[error("KMS key ID is not specified")]
    MissingKey,

    /// Secret names must be non-empty
    #[error("Secret name must not be empty")]
    InvalidName,

    /// No object exists for the secret name
    #[error("Secret not found: {name}")]
    NotFound { name: String },

    /// Authentication tag mismatch or an unreadable envelope
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    /// The envelope names an algorithm this build cannot decrypt
    #[error("Unsupported encryption algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Remote key-management failure
    #[error("Key service error: {0}")]
    KeyService(String),

    /// Object storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Local encryption failure
    #[error("Encryption failed: {0}")]
    Crypto(String),

    /// Reading the secret value for `put` failed
    #[error("Failed to read secret value from {origin}: {source}")]
    Input {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid or incomplete configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a not found error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create an integrity error
    pub fn integrity(reason: impl Into<String>) -> Self {
        Self::Integrity(reason.into())
    }

    /// Create a key service error
    pub fn key_service(message: impl Into<String>) -> Self {
        Self::KeyService(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an input error for the given origin (file path or stdin)
    pub fn input(origin: impl Into<String>, source: std::io::Error) -> Self {
        Self::Input {
            origin: origin.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
