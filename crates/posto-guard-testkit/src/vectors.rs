//! Golden test vectors for deterministic verification.
//!
//! Outputs were computed with an independent Argon2id and AES-256-GCM
//! implementation. Any change to derivation parameters,
//! envelope layout, or encoding shows up here first.

use anyhow::{ensure, Context};
use posto_guard_crypto::{
    CipherEnvelope, EnvelopeNonce, KdfParams, KeyDeriver, PasswordPolicy, Salt, UserKey,
};

/// A key derivation vector.
#[derive(Debug, Clone)]
pub struct KdfVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Password bytes.
    pub password: &'static [u8],
    /// Salt (hex, 16 bytes).
    pub salt: &'static str,
    /// Argon2id time cost.
    pub time_cost: u32,
    /// Argon2id memory cost in KiB.
    pub memory_kib: u32,
    /// Argon2id lanes.
    pub parallelism: u32,
    /// Expected key (hex, 32 bytes).
    pub expected_key: &'static str,
}

/// An envelope vector with a fixed nonce.
#[derive(Debug, Clone)]
pub struct EnvelopeVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Key byte, repeated 32 times.
    pub key_byte: u8,
    /// Nonce (hex, 12 bytes).
    pub nonce: &'static str,
    /// Plaintext field.
    pub plaintext: &'static str,
    /// Expected stored form.
    pub expected_envelope: &'static str,
}

/// Get all key derivation vectors.
pub fn all_kdf_vectors() -> Vec<KdfVector> {
    vec![
        KdfVector {
            name: "default costs, sequential salt",
            password: b"password",
            salt: "000102030405060708090a0b0c0d0e0f",
            time_cost: 1,
            memory_kib: 65536,
            parallelism: 4,
            expected_key: "48078ed1830d18386c32ae3a4d73ed8c60175dce68c9bf26199076753a6bcb11",
        },
        KdfVector {
            name: "default costs, zero salt",
            password: b"hunter2",
            salt: "00000000000000000000000000000000",
            time_cost: 1,
            memory_kib: 65536,
            parallelism: 4,
            expected_key: "a3ea23e2b53162f40de590aaa1bbd2a76efe2b9a1f7ec61930bcc1c43875e3f3",
        },
        KdfVector {
            name: "two passes, single lane",
            password: b"correct horse battery staple",
            salt: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            time_cost: 2,
            memory_kib: 1024,
            parallelism: 1,
            expected_key: "c525fad5a8ef2d4090be5a956e585352bff24258037818592576f54439662ad9",
        },
        KdfVector {
            name: "shortest password, minimal memory",
            password: b"abc",
            salt: "73616c7473616c7473616c7473616c74",
            time_cost: 1,
            memory_kib: 64,
            parallelism: 1,
            expected_key: "8d61905920cd7395e35a29b04b2570c2ea220c28335581a855184900f03f5f78",
        },
    ]
}

/// Get all envelope vectors.
pub fn all_envelope_vectors() -> Vec<EnvelopeVector> {
    vec![
        EnvelopeVector {
            name: "empty field",
            key_byte: 0x42,
            nonce: "000102030405060708090a0b",
            plaintext: "",
            expected_envelope: "AAECAwQFBgcICQoLE5O19WUdNpeE9xJRNwrg7Q==",
        },
        EnvelopeVector {
            name: "ascii field",
            key_byte: 0x42,
            nonce: "000102030405060708090a0b",
            plaintext: "Hello",
            expected_envelope: "AAECAwQFBgcICQoLTbv9sd7OHJVi7ARyCW4HjEPpL7Z6",
        },
        EnvelopeVector {
            name: "multibyte utf-8 field",
            key_byte: 0x42,
            nonce: "000102030405060708090a0b",
            plaintext: "Dear diary\u{2026} \u{2713}",
            expected_envelope: "AAECAwQFBgcICQoLQbvwr5FIm2rvf6aTd/25p6EQ3oMqR2hG/2ixw7vdxHLI",
        },
    ]
}

/// Derive the key for a vector.
pub fn derive_from_vector(v: &KdfVector) -> anyhow::Result<UserKey> {
    let deriver = KeyDeriver::new(
        KdfParams {
            time_cost: v.time_cost,
            memory_kib: v.memory_kib,
            parallelism: v.parallelism,
        },
        PasswordPolicy::default(),
    )?;
    let salt = Salt::from_slice(&hex::decode(v.salt)?)?;
    Ok(deriver.derive_with_salt(v.password, &salt)?)
}

/// Seal a vector's plaintext under its fixed nonce.
pub fn seal_from_vector(v: &EnvelopeVector) -> anyhow::Result<CipherEnvelope> {
    let key = UserKey::from_bytes([v.key_byte; 32]);
    let nonce: [u8; 12] = hex::decode(v.nonce)?
        .try_into()
        .map_err(|_| anyhow::anyhow!("nonce must be 12 bytes"))?;
    let nonce = EnvelopeNonce::from_bytes(nonce);
    let ciphertext = key.encrypt(v.plaintext.as_bytes(), &nonce)?;
    Ok(CipherEnvelope { nonce, ciphertext })
}

/// Check every vector, reporting the first mismatch.
pub fn verify_all_vectors() -> anyhow::Result<()> {
    for v in all_kdf_vectors() {
        let key = derive_from_vector(&v).with_context(|| v.name)?;
        let actual = hex::encode(key.as_bytes());
        ensure!(
            actual == v.expected_key,
            "kdf vector '{}': expected {}, got {}",
            v.name,
            v.expected_key,
            actual
        );
    }

    for v in all_envelope_vectors() {
        let envelope = seal_from_vector(&v).with_context(|| v.name)?;
        let actual = envelope.encode();
        ensure!(
            actual == v.expected_envelope,
            "envelope vector '{}': expected {}, got {}",
            v.name,
            v.expected_envelope,
            actual
        );
    }

    Ok(())
}
