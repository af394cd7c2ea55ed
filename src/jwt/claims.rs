//! Access token claims.

use crate::session::AuthMethod;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a short-lived access token.
///
/// Stateless and never persisted; verification requires no store access.
/// Wire names follow the payload format expected by API consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// Issuer.
    pub iss: String,
    /// Subject: the user id.
    pub sub: String,
    /// Audience set.
    pub aud: Vec<String>,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Token id, unique per issued token.
    pub jti: String,
    /// User email.
    pub email: String,
    /// Session the token belongs to.
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// How the session authenticated.
    #[serde(rename = "authMethod")]
    pub auth_method: AuthMethod,
}

impl AccessTokenClaims {
    /// Build claims for a user/session pair with a fresh `jti`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        issuer: String,
        subject: Uuid,
        email: String,
        session_id: Uuid,
        auth_method: AuthMethod,
        audiences: Vec<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            iss: issuer,
            sub: subject.to_string(),
            aud: audiences,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            email,
            session_id: session_id.to_string(),
            auth_method,
        }
    }

    /// Token lifetime in seconds (`exp - iat`).
    ///
    /// Saturates instead of wrapping: `exp` and `iat` come off the wire
    /// and a signed-but-hostile payload may carry extreme values.
    #[must_use]
    pub const fn lifetime_seconds(&self) -> i64 {
        self.exp.saturating_sub(self.iat)
    }
}
