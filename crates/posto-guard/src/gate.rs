//! The request-path security gate.
//!
//! Every inbound request passes through the gate before its handler:
//!
//! 1. Blocklist: an active block rejects immediately.
//! 2. Rate limiter: exceeding the quota blocks the client and rejects.
//! 3. Key presence (authenticated routes only): a valid session whose user
//!    has no key in this process is treated as logged out.
//!
//! Each step short-circuits; a rejected request leaves no state behind other
//! than the block inserted in step 2.

use std::sync::Arc;

use posto_guard_abuse::AbuseShield;
use posto_guard_cache::KeyStore;
use posto_guard_core::{Clock, ClientId, SessionUser};

use crate::error::{GuardError, Result};

/// Outcome of admitting a request on a route where login is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The session user has a usable key.
    Authenticated(SessionUser),
    /// Proceed without a user.
    Anonymous {
        /// The session named a user whose key is gone; the caller should
        /// clear the session cookie.
        drop_session: bool,
    },
}

impl GateOutcome {
    /// The admitted user, if any.
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            GateOutcome::Authenticated(user) => Some(user),
            GateOutcome::Anonymous { .. } => None,
        }
    }
}

/// Request-pipeline stage combining abuse defense with key presence.
pub struct SecurityGate<K: KeyStore> {
    shield: Arc<AbuseShield>,
    keys: Arc<K>,
    clock: Arc<dyn Clock>,
}

impl<K: KeyStore> Clone for SecurityGate<K> {
    fn clone(&self) -> Self {
        Self {
            shield: Arc::clone(&self.shield),
            keys: Arc::clone(&self.keys),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<K: KeyStore> SecurityGate<K> {
    /// Create a gate over shared state.
    pub fn new(shield: Arc<AbuseShield>, keys: Arc<K>, clock: Arc<dyn Clock>) -> Self {
        Self {
            shield,
            keys,
            clock,
        }
    }

    /// Admit a request on a public route.
    pub fn admit(&self, client: &ClientId) -> Result<()> {
        self.shield
            .admit_at(client, self.clock.now_millis())
            .map_err(GuardError::from)
    }

    /// Admit a request on a route that requires a logged-in user.
    ///
    /// Fails with [`GuardError::Unauthenticated`] when there is no valid
    /// session user and with [`GuardError::KeyUnavailable`] when the user's
    /// key is missing. Both mean the caller must force a fresh login.
    pub fn admit_required(
        &self,
        client: &ClientId,
        session: Option<&SessionUser>,
    ) -> Result<SessionUser> {
        self.admit(client)?;

        let user = match session {
            Some(user) if user.is_valid() => user,
            _ => return Err(GuardError::Unauthenticated),
        };

        if !self.keys.contains(user.id) {
            tracing::warn!(user_id = %user.id, "session valid but no key cached; forcing login");
            return Err(GuardError::KeyUnavailable { user_id: user.id });
        }

        Ok(user.clone())
    }

    /// Admit a request on a route where login is optional.
    ///
    /// Only abuse rejections fail. A session user without a cached key is
    /// downgraded to anonymous.
    pub fn admit_optional(
        &self,
        client: &ClientId,
        session: Option<&SessionUser>,
    ) -> Result<GateOutcome> {
        self.admit(client)?;

        let Some(user) = session.filter(|u| u.is_valid()) else {
            return Ok(GateOutcome::Anonymous {
                drop_session: false,
            });
        };

        if self.keys.contains(user.id) {
            Ok(GateOutcome::Authenticated(user.clone()))
        } else {
            tracing::info!(user_id = %user.id, "no key cached for session user; continuing anonymously");
            Ok(GateOutcome::Anonymous { drop_session: true })
        }
    }

    /// The abuse shield.
    pub fn shield(&self) -> &AbuseShield {
        &self.shield
    }
}
