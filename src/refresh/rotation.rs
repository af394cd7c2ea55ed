//! Refresh token rotation and reuse detection.
//!
//! The one stateful core of the crate. Per record the states are
//! Active → Rotated | Revoked | Expired, all terminal. The single
//! success transition is a conditional update guarded on the record
//! being unrevoked, so two racing rotations resolve deterministically:
//! one wins, the other is funneled into the reuse path. A legitimate
//! network retry of a rotation is indistinguishable from an attacker
//! replaying a stolen token at this layer and is treated as reuse.

use crate::audit::{event, AuditEvent, AuditSeverity, AuditSink};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::TokenError;
use crate::issuer::{TokenIssuer, TokenPair};
use crate::jwt::claims::AccessTokenClaims;
use crate::jwt::codec::TokenCodec;
use crate::jwt::validator::ClaimsValidator;
use crate::refresh::generator::RefreshTokenGenerator;
use crate::refresh::record::RefreshTokenRecord;
use crate::secret::SigningKey;
use crate::store::{RotationUpdate, SessionStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Verifies presented refresh tokens, enforces single use, detects
/// reuse, and mints replacement pairs.
pub struct RotationEngine {
    issuer: TokenIssuer,
    validator: ClaimsValidator,
    store: Arc<dyn SessionStore>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
}

impl RotationEngine {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// `TokenError::Config` when the key and configuration target
    /// different environments.
    pub fn new(
        config: Config,
        key: Arc<SigningKey>,
        store: Arc<dyn SessionStore>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        let validator = ClaimsValidator::new(&config);
        let issuer = TokenIssuer::new(
            config,
            key,
            Arc::clone(&store),
            Arc::clone(&audit),
            Arc::clone(&clock),
        )?;
        Ok(Self {
            issuer,
            validator,
            store,
            audit,
            clock,
        })
    }

    /// The issuer, for login-time pair issuance.
    #[must_use]
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Verify an access token: signature, then claims policy.
    ///
    /// Stateless; never consults the store, safe on any number of
    /// concurrent workers.
    ///
    /// # Errors
    ///
    /// Codec errors for format/signature problems, `TokenExpired` or
    /// `Claims` for policy failures.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        let claims = TokenCodec::verify(token, self.issuer.signing_key())?;
        self.validator
            .validate_access_claims(&claims, self.clock.now())?;
        Ok(claims)
    }

    /// Rotate a presented refresh token, returning a new pair.
    ///
    /// Exactly one concurrent caller for the same token can succeed;
    /// every other observes the record already consumed and triggers the
    /// reuse response: the whole family is revoked in one batch, the
    /// session is expired to force re-authentication, and a critical
    /// audit event is emitted before the error surfaces.
    ///
    /// # Errors
    ///
    /// `InvalidToken`, `RefreshExpired`, `SessionExpired`,
    /// `UserNotFound`, `ReuseDetected`, or `Storage`.
    pub async fn rotate(&self, presented: &str) -> Result<TokenPair, TokenError> {
        let (id, secret) = RefreshTokenGenerator::split_bearer(presented)?;
        let record = self
            .store
            .find_refresh_token(id)
            .await?
            .ok_or(TokenError::InvalidToken)?;

        let now = self.clock.now();
        if record.is_expired(now) {
            return Err(TokenError::RefreshExpired);
        }

        let presented_hash = RefreshTokenGenerator::hash_secret(secret, self.issuer.signing_key());
        if presented_hash != record.token_hash {
            // Wrong secret for a real id. Same error as an unknown id so
            // the response reveals nothing about which part was wrong.
            return Err(TokenError::InvalidToken);
        }

        if record.revoked_at.is_some() {
            return self.respond_to_reuse(&record, now).await;
        }

        let session = self
            .store
            .find_session(record.session_id)
            .await?
            .ok_or(TokenError::SessionExpired)?;
        if session.is_expired(now) {
            return Err(TokenError::SessionExpired);
        }
        let user = self
            .store
            .find_user(record.user_id)
            .await?
            .ok_or(TokenError::UserNotFound)?;

        // The successor is generated up front so the conditional update
        // can link it, but it is only persisted once the update wins.
        let new_secret = RefreshTokenGenerator::generate_secret();
        let new_hash = RefreshTokenGenerator::hash_secret(&new_secret, self.issuer.signing_key());
        let successor = RefreshTokenRecord::new(
            record.user_id,
            record.session_id,
            new_hash,
            now,
            self.issuer.config().refresh_token_ttl,
        );

        let update = RotationUpdate {
            revoked_at: now,
            replaced_by: successor.id,
        };
        if !self.store.cas_rotate(record.id, update).await? {
            // Lost the race: another caller consumed this token between
            // our read and the conditional update.
            return self.respond_to_reuse(&record, now).await;
        }

        self.store.insert_refresh_token(successor.clone()).await?;
        self.store.touch_session(record.session_id, now).await?;

        let access_token = self.issuer.issue_access_token(&user, &session)?;

        info!(
            token_id = %record.id,
            replaced_by = %successor.id,
            session_id = %record.session_id,
            "rotated refresh token"
        );
        self.audit
            .emit(
                AuditEvent::new(event::TOKEN_ROTATED, AuditSeverity::Info)
                    .with_field("token_id", record.id.to_string())
                    .with_field("replaced_by", successor.id.to_string())
                    .with_field("session_id", record.session_id.to_string()),
            )
            .await;

        Ok(TokenPair {
            access_token,
            refresh_token: RefreshTokenGenerator::join_bearer(successor.id, &new_secret),
            expires_in: self.issuer.config().access_token_ttl.num_seconds(),
        })
    }

    /// Revoke a single refresh token. Idempotent.
    ///
    /// # Errors
    ///
    /// `TokenError::Storage` on persistence failure.
    pub async fn revoke(&self, token_id: Uuid, reason: &str) -> Result<(), TokenError> {
        self.store.revoke(token_id, self.clock.now()).await?;
        self.audit
            .emit(
                AuditEvent::new(event::TOKEN_REVOKED, AuditSeverity::Info)
                    .with_field("token_id", token_id.to_string())
                    .with_field("reason", reason),
            )
            .await;
        Ok(())
    }

    /// Revoke every live refresh token the user holds, optionally
    /// expiring all their sessions ("log out everywhere"). Returns the
    /// number of tokens revoked.
    ///
    /// # Errors
    ///
    /// `TokenError::Storage` on persistence failure.
    pub async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        terminate_sessions: bool,
    ) -> Result<u64, TokenError> {
        let now = self.clock.now();
        let revoked = self.store.revoke_all_for_user(user_id, now).await?;
        if terminate_sessions {
            self.store.expire_sessions_for_user(user_id, now).await?;
        }

        info!(user_id = %user_id, revoked, terminate_sessions, "revoked all user tokens");
        self.audit
            .emit(
                AuditEvent::new(event::USER_TOKENS_REVOKED, AuditSeverity::Warning)
                    .with_field("user_id", user_id.to_string())
                    .with_field("revoked_count", revoked)
                    .with_field("sessions_terminated", terminate_sessions),
            )
            .await;
        Ok(revoked)
    }

    /// The reuse response: one batch family revocation, forced session
    /// re-authentication, and a critical audit event, strictly in that
    /// order and all before the error is returned.
    async fn respond_to_reuse(
        &self,
        record: &RefreshTokenRecord,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let revoked = self.store.revoke_family(record.session_id, now).await?;
        self.store.expire_session(record.session_id, now).await?;

        warn!(
            token_id = %record.id,
            session_id = %record.session_id,
            user_id = %record.user_id,
            revoked,
            "refresh token reuse detected, family revoked"
        );
        self.audit
            .emit(
                AuditEvent::new(event::TOKEN_REUSE_DETECTED, AuditSeverity::Critical)
                    .with_field("token_id", record.id.to_string())
                    .with_field("session_id", record.session_id.to_string())
                    .with_field("user_id", record.user_id.to_string())
                    .with_field("revoked_count", revoked),
            )
            .await;

        Err(TokenError::ReuseDetected)
    }
}
