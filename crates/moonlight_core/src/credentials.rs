//! Users, permissions and API tokens.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Default lifetime of an API token, in hours.
pub const TOKEN_TTL_HOURS: i64 = 3;

/// Default lifetime of an API token.
#[must_use]
pub fn default_token_ttl() -> Duration {
    Duration::hours(TOKEN_TTL_HOURS)
}

/// Access level of a user. Ordered: a higher level includes the lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Read-only access.
    Viewer,
    /// Read and write records.
    Editor,
    /// Create and drop collections.
    Administrator,
}

impl Permission {
    /// Returns true if this level satisfies `required`.
    #[must_use]
    pub fn allows(&self, required: Permission) -> bool {
        *self >= required
    }

    /// Lower-case name as stored in the registry.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::Viewer => "viewer",
            Permission::Editor => "editor",
            Permission::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Permission::Viewer),
            "editor" => Ok(Permission::Editor),
            "administrator" | "admin" => Ok(Permission::Administrator),
            other => Err(format!("unknown permissions: {other}")),
        }
    }
}

/// A registered user. The password is stored as a SHA-256 hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique login name.
    pub username: String,
    /// SHA-256 hex digest of the password.
    pub password: String,
    /// Access level.
    pub permissions: Permission,
}

/// An issued API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    /// Username the token was issued to.
    pub author: String,
    /// 64 hex characters.
    pub token: String,
    /// Expiry instant.
    pub expires: DateTime<Utc>,
    /// Issue instant.
    pub created: DateTime<Utc>,
}

impl ApiKey {
    /// Issues a fresh token for `author` valid for `ttl`.
    #[must_use]
    pub fn issue(author: impl Into<String>, ttl: Duration) -> Self {
        let created = Utc::now();
        Self {
            author: author.into(),
            token: generate_token(),
            expires: created + ttl,
            created,
        }
    }

    /// Returns true if the token is still valid at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}

/// Hashes a password with SHA-256, hex encoded.
#[must_use]
pub fn password_hash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Generates 32 random bytes, hex encoded.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
