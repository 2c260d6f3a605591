//! Password-based key derivation.
//!
//! Argon2id (memory-hard, side-channel resistant) turns a user's password and
//! per-account salt into a [`UserKey`]. Derivation is pure and deterministic;
//! it only fails on malformed input.
//!
//! Default cost parameters:
//! - Time cost: 1 pass
//! - Memory: 64 MiB
//! - Parallelism: 4 lanes
//!
//! On commodity hardware this costs tens of milliseconds per derivation.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::{UserKey, KEY_SIZE};
use crate::error::{CryptoError, Result};

/// Salt size in bytes (128 bits).
pub const SALT_SIZE: usize = 16;

/// Default Argon2id time cost (passes over memory).
pub const DEFAULT_TIME_COST: u32 = 1;

/// Default Argon2id memory cost in KiB (64 MiB).
pub const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;

/// Default Argon2id parallelism (lanes).
pub const DEFAULT_PARALLELISM: u32 = 4;

/// Shortest accepted password, in bytes.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 3;

/// Longest accepted password, in bytes.
pub const DEFAULT_MAX_PASSWORD_LEN: usize = 40;

/// A per-account random salt.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Generate a fresh salt for a new account.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice loaded from the account record.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; SALT_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!(
                "salt must be exactly {SALT_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Salt(..)")
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Number of passes over memory.
    pub time_cost: u32,
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_kib: DEFAULT_MEMORY_KIB,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl KdfParams {
    /// Convert to Argon2 parameters producing a [`KEY_SIZE`]-byte output.
    pub fn to_argon2(&self) -> Result<Params> {
        Params::new(
            self.memory_kib,
            self.time_cost,
            self.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| CryptoError::InvalidParams(e.to_string()))
    }
}

/// Accepted password length bounds, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    /// Minimum length, inclusive.
    pub min_len: usize,
    /// Maximum length, inclusive.
    pub max_len: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_MIN_PASSWORD_LEN,
            max_len: DEFAULT_MAX_PASSWORD_LEN,
        }
    }
}

impl PasswordPolicy {
    /// Check a password against the bounds.
    pub fn check(&self, password: &[u8]) -> Result<()> {
        if password.len() < self.min_len || password.len() > self.max_len {
            return Err(CryptoError::InvalidInput(format!(
                "password length must be between {} and {} bytes",
                self.min_len, self.max_len
            )));
        }
        Ok(())
    }
}

/// Derives user keys with fixed, pre-validated cost parameters.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    params: Params,
    policy: PasswordPolicy,
}

impl KeyDeriver {
    /// Create a deriver, rejecting parameters Argon2 would refuse.
    pub fn new(params: KdfParams, policy: PasswordPolicy) -> Result<Self> {
        if policy.min_len > policy.max_len {
            return Err(CryptoError::InvalidParams(format!(
                "password min length {} exceeds max length {}",
                policy.min_len, policy.max_len
            )));
        }

        Ok(Self {
            params: params.to_argon2()?,
            policy,
        })
    }

    /// Create a deriver with the documented default costs and policy.
    ///
    /// Validated through [`KeyDeriver::new`]; never substitutes other costs.
    pub fn with_defaults() -> Result<Self> {
        Self::new(KdfParams::default(), PasswordPolicy::default())
    }

    /// The password policy enforced before any KDF work.
    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Derive the key for `(password, salt)`.
    ///
    /// Input is validated before any KDF work is done.
    pub fn derive(&self, password: &[u8], salt: &[u8]) -> Result<UserKey> {
        let salt = Salt::from_slice(salt)?;
        self.derive_with_salt(password, &salt)
    }

    /// Derive the key with an already-parsed salt.
    pub fn derive_with_salt(&self, password: &[u8], salt: &Salt) -> Result<UserKey> {
        self.policy.check(password)?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let mut output = [0u8; KEY_SIZE];
        argon2
            .hash_password_into(password, salt.as_bytes(), &mut output)
            .map_err(|e| CryptoError::InvalidInput(format!("key derivation rejected input: {e}")))?;

        let key = UserKey::from_bytes(output);
        output.zeroize();
        Ok(key)
    }
}

/// Derive a key with the default parameters and password policy.
pub fn derive_key(password: &[u8], salt: &[u8]) -> Result<UserKey> {
    KeyDeriver::with_defaults()?.derive(password, salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters so property-style tests stay fast.
    fn fast() -> KeyDeriver {
        KeyDeriver::new(
            KdfParams {
                time_cost: 1,
                memory_kib: 64,
                parallelism: 1,
            },
            PasswordPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_derive_deterministic() {
        let salt = [0x11; SALT_SIZE];
        let k1 = derive_key(b"hunter2", &salt).unwrap();
        let k2 = derive_key(b"hunter2", &salt).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_derive_known_vector() {
        let key = derive_key(b"hunter2", &[0x01; SALT_SIZE]).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "0a24e0b172c48af2e7f3441f4ded3daf4143aefa6a6f4fc5866dab0cc1397243"
        );
    }

    #[test]
    fn test_defaults_match_explicit_construction() {
        let salt = [0x01; SALT_SIZE];
        let explicit = KeyDeriver::new(KdfParams::default(), PasswordPolicy::default())
            .unwrap()
            .derive(b"hunter2", &salt)
            .unwrap();
        let defaults = KeyDeriver::with_defaults()
            .unwrap()
            .derive(b"hunter2", &salt)
            .unwrap();

        assert_eq!(explicit.as_bytes(), defaults.as_bytes());
        assert_eq!(defaults.as_bytes(), derive_key(b"hunter2", &salt).unwrap().as_bytes());
    }

    #[test]
    fn test_one_bit_changes_output() {
        let kdf = fast();
        let salt = [0x22; SALT_SIZE];
        let base = kdf.derive(b"password", &salt).unwrap();

        let flipped_pw = kdf.derive(b"passwore", &salt).unwrap();
        assert_ne!(base.as_bytes(), flipped_pw.as_bytes());

        let mut other_salt = salt;
        other_salt[15] ^= 0x01;
        let flipped_salt = kdf.derive(b"password", &other_salt).unwrap();
        assert_ne!(base.as_bytes(), flipped_salt.as_bytes());
    }

    #[test]
    fn test_salt_length_enforced() {
        let kdf = fast();
        for len in [0, 8, 15, 17, 32] {
            let salt = vec![0u8; len];
            let err = kdf.derive(b"password", &salt).unwrap_err();
            assert!(matches!(err, CryptoError::InvalidInput(_)), "len {len}");
        }
    }

    #[test]
    fn test_password_bounds_enforced() {
        let kdf = fast();
        let salt = [0u8; SALT_SIZE];

        assert!(kdf.derive(b"ab", &salt).is_err());
        assert!(kdf.derive(b"abc", &salt).is_ok());
        assert!(kdf.derive(&[b'x'; 40], &salt).is_ok());
        assert!(matches!(
            kdf.derive(&[b'x'; 41], &salt),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = KdfParams {
            time_cost: 0,
            ..KdfParams::default()
        };
        assert!(matches!(
            KeyDeriver::new(params, PasswordPolicy::default()),
            Err(CryptoError::InvalidParams(_))
        ));

        let policy = PasswordPolicy {
            min_len: 10,
            max_len: 5,
        };
        assert!(KeyDeriver::new(KdfParams::default(), policy).is_err());
    }

    #[test]
    fn test_generated_salts_differ() {
        assert_ne!(Salt::generate(), Salt::generate());
    }

    #[test]
    fn test_salt_debug_hides_bytes() {
        assert_eq!(format!("{:?}", Salt::from_bytes([9; 16])), "Salt(..)");
    }
}
