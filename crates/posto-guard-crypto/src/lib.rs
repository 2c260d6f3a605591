//! # Posto Guard Crypto
//!
//! Key derivation and authenticated encryption for private post content.
//!
//! ## Overview
//!
//! - **Key derivation**: Argon2id turns a password and a 16-byte per-account
//!   salt into a 256-bit [`UserKey`]. See [`kdf`].
//! - **Content encryption**: AES-256-GCM seals a field under a fresh
//!   random 96-bit nonce into a [`CipherEnvelope`], stored as
//!   `base64(nonce || ciphertext || tag)`.
//!
//! Opening fails closed: a tag mismatch, a truncated envelope, or a wrong key
//! all produce [`CryptoError::DecryptionFailed`] and never partial plaintext.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use posto_guard_crypto::{derive_key, open_field, seal_field, Salt};
//!
//! let salt = Salt::generate();
//! let key = derive_key(b"correct horse", salt.as_bytes()).unwrap();
//!
//! let sealed = seal_field("my private title", &key).unwrap();
//! assert_eq!(open_field(&sealed, &key).unwrap(), "my private title");
//! ```

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod kdf;

pub use crypto::{EnvelopeNonce, UserKey, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use envelope::{open_field, seal_field, CipherEnvelope, MIN_ENVELOPE_LEN};
pub use error::{CryptoError, Result};
pub use kdf::{derive_key, KdfParams, KeyDeriver, PasswordPolicy, Salt, SALT_SIZE};
