//! Proptest generators for property-based testing.

use proptest::prelude::*;

use posto_guard::PostText;
use posto_guard_core::{ClientId, UserId, Visibility};
use posto_guard_crypto::{Salt, UserKey, SALT_SIZE};

/// Generate a password within the default 3..=40 byte policy.
pub fn password() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 3..=40)
}

/// Generate a password outside the default policy.
pub fn bad_password() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..3),
        prop::collection::vec(any::<u8>(), 41..=128),
    ]
}

/// Generate a random salt.
pub fn salt() -> impl Strategy<Value = Salt> {
    any::<[u8; SALT_SIZE]>().prop_map(Salt::from_bytes)
}

/// Generate a random user key.
pub fn user_key() -> impl Strategy<Value = UserKey> {
    any::<[u8; 32]>().prop_map(UserKey::from_bytes)
}

/// Generate a valid (non-zero) user id.
pub fn user_id() -> impl Strategy<Value = UserId> {
    (1u64..=u64::MAX).prop_map(UserId::new)
}

/// Generate a client identity shaped like an IPv4 address.
pub fn client_id() -> impl Strategy<Value = ClientId> {
    any::<[u8; 4]>().prop_map(|[a, b, c, d]| {
        ClientId::from(std::net::IpAddr::from([a, b, c, d]))
    })
}

/// Generate a post visibility.
pub fn visibility() -> impl Strategy<Value = Visibility> {
    prop_oneof![Just(Visibility::Public), Just(Visibility::Private)]
}

/// Generate arbitrary UTF-8 post text, empty strings included.
pub fn post_text() -> impl Strategy<Value = PostText> {
    (".{0,64}", ".{0,512}").prop_map(|(title, body)| PostText::new(title, body))
}
