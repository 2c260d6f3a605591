//! Symmetric key and nonce primitives.
//!
//! Provides the per-user 256-bit key and AES-256-GCM authenticated
//! encryption over raw byte buffers. Envelope framing lives in
//! [`crate::envelope`].

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};

/// Size of a user key in bytes (AEAD key size).
pub const KEY_SIZE: usize = 32;

/// Size of an AEAD nonce in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Size of the AEAD authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A 256-bit symmetric key derived from a user's password.
///
/// The bytes are wiped on drop and never appear in `Debug` output. Cloning
/// produces an independent copy that is wiped separately.
#[derive(Clone)]
pub struct UserKey([u8; KEY_SIZE]);

impl UserKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!(
                "key must be exactly {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Encrypt data with this key.
    ///
    /// Returns ciphertext with the authentication tag appended.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &EnvelopeNonce) -> Result<Vec<u8>> {
        self.cipher()
            .encrypt(Nonce::from_slice(&nonce.0), plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }

    /// Decrypt and authenticate data with this key.
    ///
    /// Any tag mismatch is reported as [`CryptoError::DecryptionFailed`]; no
    /// bytes are returned unless the whole buffer authenticates.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &EnvelopeNonce) -> Result<Vec<u8>> {
        self.cipher()
            .decrypt(Nonce::from_slice(&nonce.0), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed("authentication tag mismatch".into()))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl Drop for UserKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserKey(<redacted>)")
    }
}

/// A 96-bit nonce for AES-256-GCM.
///
/// Always drawn from the CSPRNG for each seal; never a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeNonce(pub [u8; NONCE_SIZE]);

impl EnvelopeNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = UserKey::generate();
        let nonce = EnvelopeNonce::generate();
        let plaintext = b"hello, world!";

        let ciphertext = key.encrypt(plaintext, &nonce).unwrap();
        assert_ne!(&ciphertext[..], &plaintext[..]);
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_SIZE);

        let decrypted = key.decrypt(&ciphertext, &nonce).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key1 = UserKey::generate();
        let key2 = UserKey::generate();
        let nonce = EnvelopeNonce::generate();

        let ciphertext = key1.encrypt(b"secret", &nonce).unwrap();

        let err = key2.decrypt(&ciphertext, &nonce).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed(_)));
    }

    #[test]
    fn test_decrypt_wrong_nonce_fails() {
        let key = UserKey::generate();
        let ciphertext = key.encrypt(b"secret", &EnvelopeNonce::from_bytes([1; 12])).unwrap();

        assert!(key
            .decrypt(&ciphertext, &EnvelopeNonce::from_bytes([2; 12]))
            .is_err());
    }

    #[test]
    fn test_key_from_slice_length() {
        assert!(UserKey::from_slice(&[0u8; 31]).is_err());
        assert!(UserKey::from_slice(&[0u8; 33]).is_err());
        let key = UserKey::from_slice(&[7u8; 32]).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; 32]);
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let key = UserKey::from_bytes([0xab; 32]);
        let debug = format!("{:?}", key);
        assert_eq!(debug, "UserKey(<redacted>)");
        assert!(!debug.contains("ab"));
    }

    #[test]
    fn test_nonces_are_fresh() {
        let a = EnvelopeNonce::generate();
        let b = EnvelopeNonce::generate();
        assert_ne!(a, b);
    }
}
