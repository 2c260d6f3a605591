//! # Posto Guard Testkit
//!
//! Testing utilities for the Posto security layer.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Argon2id and AEAD envelope cases computed by an independent implementation
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A guard with cheap KDF costs and a manual clock
//!
//! ## Golden Vectors
//!
//! ```rust
//! use posto_guard_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use posto_guard_testkit::generators::{password, salt};
//!
//! proptest! {
//!     #[test]
//!     fn derivation_is_deterministic(pw in password(), salt in salt()) {
//!         let kdf = posto_guard_testkit::fixtures::fast_deriver();
//!         let a = kdf.derive_with_salt(&pw, &salt).unwrap();
//!         let b = kdf.derive_with_salt(&pw, &salt).unwrap();
//!         prop_assert_eq!(a.as_bytes(), b.as_bytes());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use posto_guard_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let client = fixture.client("192.0.2.1");
//! assert!(fixture.guard.gate().admit(&client).is_ok());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{fast_config, fast_deriver, init_test_tracing, TestFixture};
pub use generators::{client_id, password, post_text, salt, user_id, visibility};
pub use vectors::{
    all_envelope_vectors, all_kdf_vectors, verify_all_vectors, EnvelopeVector, KdfVector,
};
