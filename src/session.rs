//! Session and user records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the session's principal authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Password login.
    Password,
    /// OAuth provider flow.
    Oauth,
    /// WebAuthn passkey.
    Passkey,
}

impl AuthMethod {
    /// Stable string form used in claims and audit context.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Oauth => "oauth",
            Self::Passkey => "passkey",
        }
    }
}

/// An already-authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id; becomes the access token `sub`.
    pub id: Uuid,
    /// Email embedded in the access token.
    pub email: String,
}

/// An authenticated session. Destroyed independently of any single
/// token family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session id.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Authentication method that established the session.
    pub auth_method: AuthMethod,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last rotation or explicit touch.
    pub last_active_at: DateTime<Utc>,
    /// Expiry; an expired session forces interactive re-login.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session starting now.
    #[must_use]
    pub fn new(user_id: Uuid, auth_method: AuthMethod, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            auth_method,
            created_at: now,
            last_active_at: now,
            expires_at: now + ttl,
        }
    }

    /// Expiry is inclusive: a session expiring exactly now is expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expiry_boundary() {
        let now = Utc::now();
        let session = Session::new(Uuid::new_v4(), AuthMethod::Password, now, Duration::days(30));

        assert!(!session.is_expired(now));
        assert!(session.is_expired(session.expires_at));
        assert!(!session.is_expired(session.expires_at - Duration::microseconds(1)));
    }

    #[test]
    fn test_auth_method_serialization() {
        let json = serde_json::to_string(&AuthMethod::Passkey).unwrap();
        assert_eq!(json, "\"passkey\"");
        assert_eq!(AuthMethod::Oauth.as_str(), "oauth");
    }
}
