//! Secret encryption using envelope encryption
//!
//! Each secret is encrypted with ChaCha20-Poly1305 under a fresh data key
//! minted by a [`KeyProvider`]. Only the wrapped data key is stored beside
//! the ciphertext; the plaintext key lives for the duration of one call.

use crate::error::{Error, Result};
use crate::keys::{GeneratedKey, KeyProvider};
use crate::types::{EncryptedObject, EncryptionAlgorithm, ENVELOPE_VERSION};
use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce, Tag};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;
use zeroize::Zeroizing;

/// Size of the nonce in bytes (96 bits for ChaCha20-Poly1305)
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Seals plaintext into [`EncryptedObject`]s and opens them again
pub struct EnvelopeCodec<K> {
    keys: K,
}

impl<K: KeyProvider> EnvelopeCodec<K> {
    pub fn new(keys: K) -> Self {
        Self { keys }
    }

    /// Get the key provider
    pub fn key_provider(&self) -> &K {
        &self.keys
    }

    /// Encrypt plaintext under a new data key wrapped by `master_key`
    ///
    /// 1. Generate a data key (one key-service call)
    /// 2. Encrypt with a random nonce, tag detached
    /// 3. Drop the data key, keep only its wrapped form
    pub async fn seal(&self, plaintext: &[u8], master_key: &str) -> Result<EncryptedObject> {
        let algorithm = EncryptionAlgorithm::ChaCha20Poly1305;
        let GeneratedKey {
            plaintext: data_key,
            wrapped,
        } = self.keys.generate_key(master_key).await?;

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let mut ciphertext = plaintext.to_vec();
        let tag = {
            let cipher = ChaCha20Poly1305::new(Key::from_slice(data_key.expose()));
            cipher
                .encrypt_in_place_detached(
                    Nonce::from_slice(&nonce),
                    &associated_data(algorithm),
                    &mut ciphertext,
                )
                .map_err(|e| Error::Crypto(e.to_string()))?
        };
        drop(data_key);

        debug!(
            "Sealed {} bytes with {} (wrapped key {} bytes)",
            plaintext.len(),
            algorithm,
            wrapped.len()
        );

        Ok(EncryptedObject {
            algorithm: algorithm.as_str().to_string(),
            nonce: nonce.to_vec(),
            ciphertext,
            tag: tag.to_vec(),
            wrapped_key: wrapped,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Decrypt an object and verify its authentication tag
    ///
    /// The algorithm and field sizes are checked before the key service is
    /// contacted.
    pub async fn open(&self, object: &EncryptedObject) -> Result<Zeroizing<Vec<u8>>> {
        let algorithm: EncryptionAlgorithm = object.algorithm.parse()?;

        if object.nonce.len() != NONCE_SIZE {
            return Err(Error::integrity(format!(
                "invalid nonce size: expected {}, got {}",
                NONCE_SIZE,
                object.nonce.len()
            )));
        }
        if object.tag.len() != TAG_SIZE {
            return Err(Error::integrity(format!(
                "invalid tag size: expected {}, got {}",
                TAG_SIZE,
                object.tag.len()
            )));
        }

        let data_key = self.keys.unwrap_key(&object.wrapped_key).await?;

        let mut plaintext = Zeroizing::new(object.ciphertext.clone());
        {
            let cipher = ChaCha20Poly1305::new(Key::from_slice(data_key.expose()));
            cipher
                .decrypt_in_place_detached(
                    Nonce::from_slice(&object.nonce),
                    &associated_data(algorithm),
                    plaintext.as_mut_slice(),
                    Tag::from_slice(&object.tag),
                )
                .map_err(|_| Error::integrity("authentication tag mismatch"))?;
        }
        drop(data_key);

        debug!("Opened {} bytes with {}", plaintext.len(), algorithm);
        Ok(plaintext)
    }
}

/// Bind the format version and algorithm into the tag
fn associated_data(algorithm: EncryptionAlgorithm) -> Vec<u8> {
    format!("ssstash/v{}/{}", ENVELOPE_VERSION, algorithm).into_bytes()
}

impl<K> std::fmt::Debug for EnvelopeCodec<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeCodec")
            .field("algorithm", &EncryptionAlgorithm::default())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{MemoryKeyProvider, MockKeyProvider};
    use crate::security::DataKey;

    fn create_test_codec() -> EnvelopeCodec<MemoryKeyProvider> {
        EnvelopeCodec::new(MemoryKeyProvider::new().with_master_key("key-1"))
    }

    #[tokio::test]
    async fn test_seal_open_roundtrip() {
        let codec = create_test_codec();
        let secret_value = b"super-secret-api-key-12345";

        let object = codec.seal(secret_value, "key-1").await.unwrap();

        assert_eq!(object.algorithm, "chacha20poly1305");
        assert_eq!(object.nonce.len(), NONCE_SIZE);
        assert_eq!(object.tag.len(), TAG_SIZE);
        assert_eq!(object.ciphertext.len(), secret_value.len());
        assert_ne!(object.ciphertext.as_slice(), secret_value.as_slice());
        assert!(!object.wrapped_key.is_empty());

        let opened = codec.open(&object).await.unwrap();
        assert_eq!(opened.as_slice(), secret_value.as_slice());
    }

    #[tokio::test]
    async fn test_roundtrip_various_plaintexts() {
        let codec = create_test_codec();
        let large = vec![b'x'; 100_000];
        let binary: Vec<u8> = (0..=255u8).collect();
        let unicode = "secret-with-unicode-emoji-\u{1F512}".as_bytes().to_vec();

        for plaintext in [Vec::new(), large, binary, unicode] {
            let object = codec.seal(&plaintext, "key-1").await.unwrap();
            let opened = codec.open(&object).await.unwrap();
            assert_eq!(opened.as_slice(), plaintext.as_slice());
        }
    }

    #[tokio::test]
    async fn test_same_plaintext_seals_differently() {
        let codec = create_test_codec();

        let a = codec.seal(b"same", "key-1").await.unwrap();
        let b = codec.seal(b"same", "key-1").await.unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.wrapped_key, b.wrapped_key);
    }

    #[tokio::test]
    async fn test_one_key_service_call_per_operation() {
        let codec = create_test_codec();

        let object = codec.seal(b"value", "key-1").await.unwrap();
        codec.open(&object).await.unwrap();

        assert_eq!(codec.key_provider().generate_calls(), 1);
        assert_eq!(codec.key_provider().unwrap_calls(), 1);
    }

    #[tokio::test]
    async fn test_ciphertext_bit_flips_detected() {
        let codec = create_test_codec();
        let object = codec.seal(b"tamper-me", "key-1").await.unwrap();

        for byte in 0..object.ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = object.clone();
                tampered.ciphertext[byte] ^= 1 << bit;
                let result = codec.open(&tampered).await;
                assert!(matches!(result, Err(Error::Integrity(_))));
            }
        }
    }

    #[tokio::test]
    async fn test_tag_bit_flips_detected() {
        let codec = create_test_codec();
        let object = codec.seal(b"tamper-me", "key-1").await.unwrap();

        for byte in 0..TAG_SIZE {
            for bit in 0..8 {
                let mut tampered = object.clone();
                tampered.tag[byte] ^= 1 << bit;
                let result = codec.open(&tampered).await;
                assert!(matches!(result, Err(Error::Integrity(_))));
            }
        }
    }

    #[tokio::test]
    async fn test_nonce_tamper_detected() {
        let codec = create_test_codec();
        let mut object = codec.seal(b"tamper-me", "key-1").await.unwrap();
        object.nonce[0] ^= 0x80;

        assert!(matches!(codec.open(&object).await, Err(Error::Integrity(_))));
    }

    #[tokio::test]
    async fn test_truncated_tag_rejected() {
        let codec = create_test_codec();
        let mut object = codec.seal(b"value", "key-1").await.unwrap();
        object.tag.truncate(8);

        assert!(matches!(codec.open(&object).await, Err(Error::Integrity(_))));
        assert_eq!(codec.key_provider().unwrap_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_algorithm_rejected_before_unwrap() {
        let mut keys = MockKeyProvider::new();
        keys.expect_unwrap_key().never();
        let codec = EnvelopeCodec::new(keys);

        let object = EncryptedObject {
            algorithm: "aes-512-quantum".to_string(),
            nonce: vec![0; NONCE_SIZE],
            ciphertext: vec![1, 2, 3],
            tag: vec![0; TAG_SIZE],
            wrapped_key: vec![9; 8],
            created_at: String::new(),
        };

        let result = codec.open(&object).await;
        assert!(matches!(
            result,
            Err(Error::UnsupportedAlgorithm(id)) if id == "aes-512-quantum"
        ));
    }

    #[tokio::test]
    async fn test_key_service_failure_propagates() {
        let mut keys = MockKeyProvider::new();
        keys.expect_generate_key()
            .times(1)
            .returning(|_| Err(Error::key_service("AccessDeniedException")));
        let codec = EnvelopeCodec::new(keys);

        let result = codec.seal(b"value", "arn:aws:kms:us-east-1:000000000000:key/x").await;
        assert!(matches!(result, Err(Error::KeyService(_))));
    }

    #[tokio::test]
    async fn test_seal_passes_master_key_through() {
        let mut keys = MockKeyProvider::new();
        keys.expect_generate_key()
            .withf(|master_key: &str| master_key == "alias/ssstash")
            .times(1)
            .returning(|_| {
                Ok(GeneratedKey {
                    plaintext: DataKey::from_slice(&[7u8; 32]).unwrap(),
                    wrapped: b"wrapped-by-kms".to_vec(),
                })
            });
        keys.expect_unwrap_key()
            .withf(|wrapped: &[u8]| wrapped == b"wrapped-by-kms")
            .times(1)
            .returning(|_| DataKey::from_slice(&[7u8; 32]));
        let codec = EnvelopeCodec::new(keys);

        let object = codec.seal(b"value", "alias/ssstash").await.unwrap();
        assert_eq!(object.wrapped_key, b"wrapped-by-kms");

        let opened = codec.open(&object).await.unwrap();
        assert_eq!(opened.as_slice(), b"value");
    }

    #[tokio::test]
    async fn test_wrong_data_key_is_integrity_error() {
        let mut keys = MockKeyProvider::new();
        keys.expect_generate_key().returning(|_| {
            Ok(GeneratedKey {
                plaintext: DataKey::from_slice(&[1u8; 32]).unwrap(),
                wrapped: b"w".to_vec(),
            })
        });
        keys.expect_unwrap_key()
            .returning(|_| DataKey::from_slice(&[2u8; 32]));
        let codec = EnvelopeCodec::new(keys);

        let object = codec.seal(b"value", "key-1").await.unwrap();
        assert!(matches!(codec.open(&object).await, Err(Error::Integrity(_))));
    }
}
