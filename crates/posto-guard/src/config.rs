//! Configuration for the security layer.
//!
//! Every knob has a documented default; a deployment that wants different
//! costs or quotas supplies a JSON document with only the fields it changes.
//!
//! ```json
//! {
//!   "kdf": { "time_cost": 2, "memory_kib": 65536, "parallelism": 4 },
//!   "rate_limit": { "max_requests": 120, "window_secs": 60 },
//!   "block": { "block_secs": 3600 }
//! }
//! ```

use std::path::Path;

use posto_guard_abuse::{BlockConfig, RateLimitConfig};
use posto_guard_crypto::{KdfParams, KeyDeriver, PasswordPolicy};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for [`crate::Guard`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Argon2id cost parameters.
    pub kdf: KdfParams,
    /// Accepted password length bounds.
    pub password: PasswordPolicy,
    /// Per-client request quota.
    pub rate_limit: RateLimitConfig,
    /// Block applied when a client exceeds its quota.
    pub block: BlockConfig,
}

impl GuardConfig {
    /// Parse from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        KeyDeriver::new(self.kdf, self.password)?;
        self.rate_limit.validate()?;
        self.block.validate()?;
        Ok(())
    }
}
