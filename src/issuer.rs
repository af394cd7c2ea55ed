//! Token issuance.

use crate::audit::{event, AuditEvent, AuditSeverity, AuditSink};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::TokenError;
use crate::jwt::claims::AccessTokenClaims;
use crate::jwt::codec::TokenCodec;
use crate::refresh::generator::RefreshTokenGenerator;
use crate::refresh::record::RefreshTokenRecord;
use crate::secret::SigningKey;
use crate::session::{Session, UserProfile};
use crate::store::SessionStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A freshly minted access/refresh pair, shaped for the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Signed access token.
    pub access_token: String,
    /// Opaque single-use refresh token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Builds access and refresh tokens for an authenticated principal.
pub struct TokenIssuer {
    config: Config,
    key: Arc<SigningKey>,
    store: Arc<dyn SessionStore>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Create an issuer.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Config` if the signing key was validated for
    /// a different environment than the configuration targets.
    pub fn new(
        config: Config,
        key: Arc<SigningKey>,
        store: Arc<dyn SessionStore>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        if key.environment() != config.environment {
            return Err(TokenError::config(format!(
                "signing key resolved for {} used in {}",
                key.environment().as_str(),
                config.environment.as_str()
            )));
        }
        Ok(Self {
            config,
            key,
            store,
            audit,
            clock,
        })
    }

    /// Issue a signed access token for a user/session pair.
    ///
    /// Pure apart from clock access: nothing is persisted, access tokens
    /// are stateless.
    ///
    /// # Errors
    ///
    /// `TokenError::TokenFormat` if claim serialization fails.
    pub fn issue_access_token(
        &self,
        user: &UserProfile,
        session: &Session,
    ) -> Result<String, TokenError> {
        let claims = AccessTokenClaims::new(
            self.config.issuer.clone(),
            user.id,
            user.email.clone(),
            session.id,
            session.auth_method,
            self.config.audiences.clone(),
            self.clock.now(),
            self.config.access_token_ttl,
        );
        TokenCodec::sign(&claims, &self.key)
    }

    /// Issue a refresh token: generate the secret, persist its keyed hash,
    /// and return the bearer form plus the stored record.
    ///
    /// The record is durably written before the bearer token is returned,
    /// so a caller never holds a token the store has no record of.
    ///
    /// # Errors
    ///
    /// `TokenError::Storage` when the persistence write fails.
    pub async fn issue_refresh_token(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<(String, RefreshTokenRecord), TokenError> {
        let secret = RefreshTokenGenerator::generate_secret();
        let token_hash = RefreshTokenGenerator::hash_secret(&secret, &self.key);

        let record = RefreshTokenRecord::new(
            user_id,
            session_id,
            token_hash,
            self.clock.now(),
            self.config.refresh_token_ttl,
        );
        self.store.insert_refresh_token(record.clone()).await?;

        info!(token_id = %record.id, session_id = %session_id, "issued refresh token");

        Ok((RefreshTokenGenerator::join_bearer(record.id, &secret), record))
    }

    /// Issue a full pair: the refresh record is written first, then the
    /// access token is minted.
    ///
    /// # Errors
    ///
    /// Propagates storage and signing failures.
    pub async fn issue_pair(
        &self,
        user: &UserProfile,
        session: &Session,
    ) -> Result<TokenPair, TokenError> {
        let (refresh_token, record) = self.issue_refresh_token(user.id, session.id).await?;
        let access_token = self.issue_access_token(user, session)?;

        self.audit
            .emit(
                AuditEvent::new(event::TOKEN_PAIR_ISSUED, AuditSeverity::Info)
                    .with_field("token_id", record.id.to_string())
                    .with_field("session_id", session.id.to_string())
                    .with_field("user_id", user.id.to_string()),
            )
            .await;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.config.access_token_ttl.num_seconds(),
        })
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }
}
