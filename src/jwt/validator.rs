//! Claims validation over already-decoded payloads.
//!
//! The codec proves the signature; this validator proves the payload is
//! one this deployment is willing to accept. Claims are a concrete typed
//! struct, never probed by optional-property presence.

use crate::config::{Config, Environment};
use crate::error::TokenError;
use crate::jwt::claims::AccessTokenClaims;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Hex prefix marking a subject as test data ("7e57" reads as "test").
pub const TEST_SUBJECT_PREFIX: &str = "7e57";
/// Fixed demo-account prefix, also acceptable outside production.
pub const DEMO_SUBJECT_PREFIX: &str = "00000000";

/// Minimum distinct hex digits a production `jti` must contain.
const MIN_JTI_DISTINCT_DIGITS: usize = 6;

/// Validates access token claims against deployment policy.
#[derive(Debug, Clone)]
pub struct ClaimsValidator {
    environment: Environment,
    issuer: String,
    audiences: Vec<String>,
    max_lifetime: Duration,
}

impl ClaimsValidator {
    /// Build a validator from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            environment: config.environment,
            issuer: config.issuer.clone(),
            audiences: config.audiences.clone(),
            max_lifetime: config.max_token_lifetime,
        }
    }

    /// Validate shape, timing bounds, issuer, audience, subject, and jti.
    ///
    /// # Errors
    ///
    /// `TokenError::Claims` for policy failures, `TokenError::TokenExpired`
    /// when `exp` has passed.
    pub fn validate_access_claims(
        &self,
        claims: &AccessTokenClaims,
        now: DateTime<Utc>,
    ) -> Result<(), TokenError> {
        if claims.sub.is_empty() {
            return Err(TokenError::Claims("sub is required".to_string()));
        }
        if claims.exp <= claims.iat {
            return Err(TokenError::Claims("exp must be after iat".to_string()));
        }
        if claims.lifetime_seconds() > self.max_lifetime.num_seconds() {
            return Err(TokenError::Claims(
                "token lifetime exceeds absolute ceiling".to_string(),
            ));
        }
        if claims.exp <= now.timestamp() {
            return Err(TokenError::TokenExpired);
        }
        if claims.iss != self.issuer {
            return Err(TokenError::Claims("issuer mismatch".to_string()));
        }
        if !claims.aud.iter().any(|a| self.audiences.contains(a)) {
            return Err(TokenError::Claims("audience mismatch".to_string()));
        }

        self.validate_subject(&claims.sub)?;
        self.validate_jti(&claims.jti)?;
        Ok(())
    }

    /// Validate the subject: UUID format plus environment marker policy.
    ///
    /// Non-production subjects must carry the test or demo prefix so test
    /// identities can never be minted against production data; production
    /// rejects marked subjects outright.
    ///
    /// # Errors
    ///
    /// `TokenError::Claims` on format or marker violations.
    pub fn validate_subject(&self, sub: &str) -> Result<(), TokenError> {
        if Uuid::parse_str(sub).is_err() {
            return Err(TokenError::Claims("subject is not a UUID".to_string()));
        }

        let marked = sub.starts_with(TEST_SUBJECT_PREFIX) || sub.starts_with(DEMO_SUBJECT_PREFIX);
        if self.environment.is_production() {
            if marked {
                return Err(TokenError::Claims(
                    "test-marked subject rejected in production".to_string(),
                ));
            }
        } else if !marked {
            return Err(TokenError::Claims(
                "non-production subject missing test marker".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate the token id: UUID format, plus an entropy floor in
    /// production to reject sequential or low-variance identifiers.
    ///
    /// # Errors
    ///
    /// `TokenError::Claims` on format or entropy violations.
    pub fn validate_jti(&self, jti: &str) -> Result<(), TokenError> {
        let parsed =
            Uuid::parse_str(jti).map_err(|_| TokenError::Claims("jti is not a UUID".to_string()))?;

        if self.environment.is_production() {
            let hex = parsed.simple().to_string();
            let mut seen = [false; 16];
            for c in hex.bytes() {
                let v = match c {
                    b'0'..=b'9' => c - b'0',
                    b'a'..=b'f' => c - b'a' + 10,
                    _ => continue,
                };
                seen[v as usize] = true;
            }
            let distinct = seen.iter().filter(|s| **s).count();
            if distinct < MIN_JTI_DISTINCT_DIGITS {
                return Err(TokenError::Claims(
                    "jti entropy below production floor".to_string(),
                ));
            }
        }
        Ok(())
    }
}
