//! Strong type definitions for the Posto security layer.
//!
//! Identities are newtypes so that an authenticated user id can never be
//! confused with a network-level client identity at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::error::{CoreError, Result};

/// An authenticated application user identifier.
///
/// Assigned by the account store. Zero is never a valid account id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl UserId {
    /// Create a user id from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Whether this id can refer to a real account.
    pub const fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A network-level client identity, typically the source address.
///
/// Used only for abuse tracking. Never an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Create a client id from an arbitrary identifier string.
    ///
    /// Leading and trailing whitespace is ignored; an empty identity is rejected.
    pub fn new(id: impl AsRef<str>) -> Result<Self> {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyClientId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<IpAddr> for ClientId {
    fn from(addr: IpAddr) -> Self {
        Self(addr.to_string())
    }
}

impl TryFrom<&str> for ClientId {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// The user payload stored in a session cookie by the request layer.
///
/// A typed payload replaces any dynamic lookup of session values; a session
/// either deserializes into this struct or carries no user at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The account id.
    pub id: UserId,
    /// The account's username.
    pub username: String,
}

impl SessionUser {
    /// Create a session payload.
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            username: username.into(),
        }
    }

    /// A session user is valid when it names a real account.
    pub fn is_valid(&self) -> bool {
        self.id.is_valid() && !self.username.is_empty()
    }
}

/// Whether a post is readable by everyone or only by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Stored and served in plain form.
    Public,
    /// Stored sealed under the owner's key.
    Private,
}

impl Visibility {
    /// Check if the content is public.
    pub const fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl From<bool> for Visibility {
    fn from(is_public: bool) -> Self {
        if is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_validity() {
        assert!(!UserId::new(0).is_valid());
        assert!(UserId::new(7).is_valid());
        assert_eq!(UserId::from(7).to_string(), "7");
    }

    #[test]
    fn test_client_id_rejects_empty() {
        assert!(ClientId::new("").is_err());
        assert!(ClientId::new("   ").is_err());
    }

    #[test]
    fn test_client_id_trims() {
        let id = ClientId::new(" 10.0.0.1 ").unwrap();
        assert_eq!(id.as_str(), "10.0.0.1");
    }

    #[test]
    fn test_client_id_from_ip() {
        let addr: IpAddr = "192.168.1.20".parse().unwrap();
        assert_eq!(ClientId::from(addr).as_str(), "192.168.1.20");
    }

    #[test]
    fn test_session_user_validity() {
        assert!(SessionUser::new(1, "alice").is_valid());
        assert!(!SessionUser::new(0, "alice").is_valid());
        assert!(!SessionUser::new(1, "").is_valid());
    }

    #[test]
    fn test_session_user_serde() {
        let user = SessionUser::new(42, "bob");
        let json = serde_json::to_string(&user).unwrap();
        let back: SessionUser = serde_json::from_str(&json).unwrap();
        assert_eq!(user, back);
    }

    #[test]
    fn test_visibility_from_bool() {
        assert_eq!(Visibility::from(true), Visibility::Public);
        assert_eq!(Visibility::from(false), Visibility::Private);
        assert!(Visibility::Public.is_public());
        assert!(!Visibility::Private.is_public());
    }
}
