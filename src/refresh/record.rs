//! Refresh token records and their lifecycle states.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a refresh token record.
///
/// `Active` is the only non-terminal state; no record is ever
/// reactivated. `Expired` is detected lazily on lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    /// Usable for exactly one rotation.
    Active,
    /// Consumed by rotation; `replaced_by` points at the successor.
    Rotated,
    /// Explicitly or reuse-cascade revoked.
    Revoked,
    /// Past its expiry.
    Expired,
}

/// Persisted state of one refresh token.
///
/// The record `id` is the public half of the bearer token; the secret
/// half exists only as `token_hash`. Records connected by `replaced_by`
/// plus their shared `session_id` form a token family, which is the
/// unit of cascade revocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Opaque id; becomes the bearer token's public component.
    pub id: Uuid,
    /// Keyed one-way hash of the secret component. Unique.
    pub token_hash: String,
    /// Owning user.
    pub user_id: Uuid,
    /// Session this token belongs to.
    pub session_id: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Expiry (creation + 7 days by default).
    pub expires_at: DateTime<Utc>,
    /// Set when rotated or revoked. Rotation always revokes the source.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Successor record id; set only by rotation.
    pub replaced_by: Option<Uuid>,
}

impl RefreshTokenRecord {
    /// Create an active record starting now.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        session_id: Uuid,
        token_hash: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            token_hash,
            user_id,
            session_id,
            created_at: now,
            expires_at: now + ttl,
            revoked_at: None,
            replaced_by: None,
        }
    }

    /// Derive the lifecycle state at `now`.
    #[must_use]
    pub fn state(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.revoked_at.is_some() {
            if self.replaced_by.is_some() {
                RefreshTokenState::Rotated
            } else {
                RefreshTokenState::Revoked
            }
        } else if self.is_expired(now) {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }

    /// Expiry is inclusive: a record expiring exactly now is expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
