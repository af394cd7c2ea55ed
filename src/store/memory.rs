//! In-memory `SessionStore`.
//!
//! Reference implementation used by the test suites and suitable for
//! single-process deployments. One mutex guards all tables, so the
//! conditional rotate and the family-wide revoke each run as a single
//! critical section.

use crate::error::TokenError;
use crate::refresh::record::RefreshTokenRecord;
use crate::session::{Session, UserProfile};
use crate::store::{RotationUpdate, SessionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    tokens: HashMap<Uuid, RefreshTokenRecord>,
    sessions: HashMap<Uuid, Session>,
    users: HashMap<Uuid, UserProfile>,
}

/// Mutex-guarded in-memory store.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Tables>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user profile.
    pub async fn insert_user(&self, user: UserProfile) {
        self.inner.lock().await.users.insert(user.id, user);
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn find_refresh_token(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, TokenError> {
        Ok(self.inner.lock().await.tokens.get(&id).cloned())
    }

    async fn insert_refresh_token(&self, record: RefreshTokenRecord) -> Result<(), TokenError> {
        let mut tables = self.inner.lock().await;
        if tables.tokens.contains_key(&record.id) {
            return Err(TokenError::storage(format!(
                "duplicate refresh token id {}",
                record.id
            )));
        }
        tables.tokens.insert(record.id, record);
        Ok(())
    }

    async fn cas_rotate(&self, id: Uuid, update: RotationUpdate) -> Result<bool, TokenError> {
        let mut tables = self.inner.lock().await;
        match tables.tokens.get_mut(&id) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(update.revoked_at);
                record.replaced_by = Some(update.replaced_by);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), TokenError> {
        let mut tables = self.inner.lock().await;
        if let Some(record) = tables.tokens.get_mut(&id) {
            if record.revoked_at.is_none() {
                record.revoked_at = Some(now);
            }
        }
        Ok(())
    }

    async fn revoke_family(&self, session_id: Uuid, now: DateTime<Utc>) -> Result<u64, TokenError> {
        let mut tables = self.inner.lock().await;
        let mut count = 0;
        for record in tables.tokens.values_mut() {
            if record.session_id == session_id && record.revoked_at.is_none() {
                record.revoked_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, TokenError> {
        let mut tables = self.inner.lock().await;
        let mut count = 0;
        for record in tables.tokens.values_mut() {
            if record.user_id == user_id && record.revoked_at.is_none() {
                record.revoked_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, TokenError> {
        Ok(self.inner.lock().await.sessions.get(&id).cloned())
    }

    async fn insert_session(&self, session: Session) -> Result<(), TokenError> {
        self.inner.lock().await.sessions.insert(session.id, session);
        Ok(())
    }

    async fn touch_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), TokenError> {
        if let Some(session) = self.inner.lock().await.sessions.get_mut(&id) {
            session.last_active_at = now;
        }
        Ok(())
    }

    async fn expire_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), TokenError> {
        if let Some(session) = self.inner.lock().await.sessions.get_mut(&id) {
            if session.expires_at > now {
                session.expires_at = now;
            }
        }
        Ok(())
    }

    async fn expire_sessions_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, TokenError> {
        let mut tables = self.inner.lock().await;
        let mut count = 0;
        for session in tables.sessions.values_mut() {
            if session.user_id == user_id && session.expires_at > now {
                session.expires_at = now;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserProfile>, TokenError> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }
}
