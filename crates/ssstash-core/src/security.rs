//! Security utilities for secret storage
//!
//! Provides:
//! - DataKey, a 256-bit key zeroed on drop
//! - Audit logging (never logs secret values or keys)

use crate::error::{Error, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a data encryption key in bytes (256 bits)
pub const DATA_KEY_LEN: usize = 32;

/// A symmetric data key that is automatically zeroed on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DataKey {
    bytes: [u8; DATA_KEY_LEN],
}

impl DataKey {
    /// Generate a random key from the operating system RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; DATA_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Copy key material returned by a key service
    pub fn from_slice(material: &[u8]) -> Result<Self> {
        if material.len() != DATA_KEY_LEN {
            return Err(Error::key_service(format!(
                "data key must be {} bytes, got {} bytes",
                DATA_KEY_LEN,
                material.len()
            )));
        }

        let mut bytes = [0u8; DATA_KEY_LEN];
        bytes.copy_from_slice(material);
        Ok(Self { bytes })
    }

    /// Get the raw key bytes (use with caution)
    pub fn expose(&self) -> &[u8; DATA_KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataKey([REDACTED {} bytes])", DATA_KEY_LEN)
    }
}

/// Audit log entry for secret operations
#[derive(Debug, Clone)]
pub struct AuditLog {
    pub operation: &'static str,
    pub secret_name: Option<String>,
    pub bucket: String,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: std::time::SystemTime,
}

impl AuditLog {
    pub fn new(operation: &'static str, secret_name: Option<&str>, bucket: &str) -> Self {
        Self {
            operation,
            secret_name: secret_name.map(str::to_string),
            bucket: bucket.to_string(),
            success: true,
            error: None,
            timestamp: std::time::SystemTime::now(),
        }
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.success = false;
        self.error = Some(error);
        self
    }

    /// Log the outcome of an operation and hand the result back
    pub fn record<T>(self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.log(),
            Err(e) => self.with_error(e.to_string()).log(),
        }
        result
    }

    /// Log the audit entry (never logs secret values)
    pub fn log(&self) {
        let secret_name = self.secret_name.as_deref().unwrap_or("*");
        if self.success {
            tracing::info!(
                operation = self.operation,
                secret_name = %secret_name,
                bucket = %self.bucket,
                timestamp = ?self.timestamp,
                "Secret operation successful"
            );
        } else {
            tracing::warn!(
                operation = self.operation,
                secret_name = %secret_name,
                bucket = %self.bucket,
                error = ?self.error,
                timestamp = ?self.timestamp,
                "Secret operation failed"
            );
        }
    }
}
