//! Persistence interface consumed by the rotation engine.
//!
//! The engine never holds locks of its own; every consistency guarantee
//! it needs is expressed through this narrow interface, most importantly
//! the conditional rotate. Implementations may be backed by any store
//! that can perform that update atomically.

pub mod memory;

use crate::error::TokenError;
use crate::refresh::record::RefreshTokenRecord;
use crate::session::{Session, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use memory::InMemoryStore;

/// Fields applied by a successful conditional rotation.
#[derive(Debug, Clone, Copy)]
pub struct RotationUpdate {
    /// Revocation timestamp for the consumed record.
    pub revoked_at: DateTime<Utc>,
    /// Id of the successor record.
    pub replaced_by: Uuid,
}

/// Narrow persistence interface for sessions, users, and refresh tokens.
///
/// All keyed lookups are by opaque id or hash, never by raw secret.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a refresh token record by id.
    async fn find_refresh_token(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, TokenError>;

    /// Persist a new refresh token record.
    async fn insert_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), TokenError>;

    /// Conditionally mark a record rotated, guarded on `revoked_at` being
    /// unset. Must be atomic: of any number of concurrent callers for the
    /// same id, exactly one may observe `true`.
    async fn cas_rotate(&self, id: Uuid, update: RotationUpdate) -> Result<bool, TokenError>;

    /// Revoke one record. Idempotent: revoking an already-revoked record
    /// is a no-op, not an error.
    async fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), TokenError>;

    /// Revoke every non-revoked record in the session's token family as
    /// one logical batch. Returns the number of records revoked.
    async fn revoke_family(&self, session_id: Uuid, now: DateTime<Utc>) -> Result<u64, TokenError>;

    /// Revoke every non-revoked record belonging to the user. Returns the
    /// number of records revoked.
    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, TokenError>;

    /// Look up a session by id.
    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, TokenError>;

    /// Persist a new session.
    async fn insert_session(&self, session: Session) -> Result<(), TokenError>;

    /// Update the session's `last_active_at`.
    async fn touch_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), TokenError>;

    /// Expire a session immediately, forcing re-authentication.
    async fn expire_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), TokenError>;

    /// Expire every session belonging to the user. Returns the number of
    /// sessions expired.
    async fn expire_sessions_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, TokenError>;

    /// Look up the user profile for claim construction.
    async fn find_user(&self, id: Uuid) -> Result<Option<UserProfile>, TokenError>;
}
