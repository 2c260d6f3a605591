//! Sealed content envelope.
//!
//! A private post field is stored as a single base64 string holding
//! `nonce (12) || ciphertext || tag (16)`. Title and body are sealed
//! independently, each under a fresh nonce.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::crypto::{EnvelopeNonce, UserKey, NONCE_SIZE, TAG_SIZE};
use crate::error::{CryptoError, Result};

/// Smallest well-formed envelope: a nonce and a tag around empty plaintext.
pub const MIN_ENVELOPE_LEN: usize = NONCE_SIZE + TAG_SIZE;

/// Encrypted content in its persisted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherEnvelope {
    /// Nonce used for encryption (unique per seal).
    pub nonce: EnvelopeNonce,

    /// The encrypted data (includes authentication tag).
    pub ciphertext: Vec<u8>,
}

impl CipherEnvelope {
    /// Encrypt plaintext under a freshly generated nonce.
    pub fn seal(plaintext: &[u8], key: &UserKey) -> Result<Self> {
        let nonce = EnvelopeNonce::generate();
        let ciphertext = key.encrypt(plaintext, &nonce)?;

        Ok(Self { nonce, ciphertext })
    }

    /// Decrypt with the given key.
    pub fn open(&self, key: &UserKey) -> Result<Vec<u8>> {
        key.decrypt(&self.ciphertext, &self.nonce)
    }

    /// Serialize to `nonce || ciphertext || tag`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        buf.extend_from_slice(self.nonce.as_bytes());
        buf.extend_from_slice(&self.ciphertext);
        buf
    }

    /// Parse from `nonce || ciphertext || tag`.
    ///
    /// A buffer too short to hold a nonce and a tag is malformed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_ENVELOPE_LEN {
            return Err(CryptoError::DecryptionFailed(format!(
                "envelope too short: {} bytes, need at least {MIN_ENVELOPE_LEN}",
                bytes.len()
            )));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
        let mut arr = [0u8; NONCE_SIZE];
        arr.copy_from_slice(nonce);

        Ok(Self {
            nonce: EnvelopeNonce::from_bytes(arr),
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Encode as the base64 string stored by the persistence layer.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decode from the stored base64 string.
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Get the size of the ciphertext, tag included.
    pub fn ciphertext_len(&self) -> usize {
        self.ciphertext.len()
    }
}

/// Seal a UTF-8 field and return its stored form.
pub fn seal_field(plaintext: &str, key: &UserKey) -> Result<String> {
    Ok(CipherEnvelope::seal(plaintext.as_bytes(), key)?.encode())
}

/// Open a stored field back into text.
///
/// Fails closed: malformed input, a tag mismatch, or authenticated bytes that
/// are not UTF-8 all yield [`CryptoError::DecryptionFailed`].
pub fn open_field(encoded: &str, key: &UserKey) -> Result<String> {
    let plaintext = CipherEnvelope::decode(encoded)?.open(key)?;
    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::DecryptionFailed("plaintext is not valid UTF-8".into()))
}
