//! Error types for the token lifecycle engine.
//!
//! Every failure is a typed value; nothing is silently recovered or
//! collapsed into a boolean. Variants map one-to-one onto the wire error
//! codes consumed by callers.

use crate::config::Environment;
use thiserror::Error;

/// Errors produced by token issuance, verification, and rotation.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Bad, missing, or weak secret/configuration. Fatal at startup,
    /// never produced at request time.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed wire format (segment count, encoding, payload shape).
    #[error("malformed token: {0}")]
    TokenFormat(String),

    /// Incoming token header declared an algorithm other than HS256.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// HMAC signature did not match.
    #[error("token signature invalid")]
    SignatureInvalid,

    /// Refresh token unknown or its secret component did not match.
    /// Deliberately does not reveal which part was wrong.
    #[error("invalid token")]
    InvalidToken,

    /// Access token past its `exp` claim.
    #[error("access token expired")]
    TokenExpired,

    /// Refresh token record past its expiry.
    #[error("refresh token expired")]
    RefreshExpired,

    /// An already-rotated or revoked refresh token was presented again.
    /// The family has been revoked as a side effect before this surfaces.
    #[error("refresh token reuse detected")]
    ReuseDetected,

    /// The session backing the token is gone or expired.
    #[error("session expired")]
    SessionExpired,

    /// The token's user no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// A claim failed shape or policy validation.
    #[error("invalid claims: {0}")]
    Claims(String),

    /// Opaque persistence failure. Retryable by the caller with backoff;
    /// never retried inside the engine.
    #[error("storage error: {0}")]
    Storage(String),
}

impl TokenError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Wire error code for API responses.
    #[must_use]
    pub const fn wire_code(&self) -> &'static str {
        match self {
            Self::Config(_) => CONFIGURATION_ERROR,
            Self::TokenFormat(_) | Self::UnsupportedAlgorithm(_) => TOKEN_MALFORMED,
            Self::SignatureInvalid | Self::InvalidToken | Self::Claims(_) => INVALID_TOKEN,
            Self::TokenExpired | Self::RefreshExpired => TOKEN_EXPIRED,
            Self::ReuseDetected => TOKEN_REUSE_DETECTED,
            Self::SessionExpired => SESSION_EXPIRED,
            Self::UserNotFound => USER_NOT_FOUND,
            Self::Storage(_) => STORAGE_ERROR,
        }
    }

    /// HTTP status for the wire-level contract.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::TokenFormat(_) | Self::UnsupportedAlgorithm(_) => 400,
            Self::SignatureInvalid
            | Self::InvalidToken
            | Self::Claims(_)
            | Self::TokenExpired
            | Self::RefreshExpired
            | Self::ReuseDetected
            | Self::SessionExpired
            | Self::UserNotFound => 401,
            Self::Config(_) | Self::Storage(_) => 500,
        }
    }

    /// Whether the caller may retry the operation.
    ///
    /// Only opaque storage failures are transient; every token-level
    /// failure is deterministic and retrying would not change the outcome.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Message suitable for the client response.
    ///
    /// Production collapses auth failures into a generic message; the
    /// full detail still reaches the audit sink. Non-production keeps the
    /// diagnostic detail in the response.
    #[must_use]
    pub fn public_message(&self, environment: Environment) -> String {
        if environment.is_production() {
            match self {
                Self::Config(_) => "service misconfigured".to_string(),
                Self::Storage(_) => "temporary failure, retry later".to_string(),
                _ => "invalid or expired session".to_string(),
            }
        } else {
            self.to_string()
        }
    }
}

/// Wire code for configuration failures.
pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
/// Wire code for malformed token input.
pub const TOKEN_MALFORMED: &str = "TOKEN_MALFORMED";
/// Wire code for unknown, forged, or policy-failing tokens.
pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
/// Wire code for expired access or refresh tokens.
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
/// Wire code for detected refresh token reuse.
pub const TOKEN_REUSE_DETECTED: &str = "TOKEN_REUSE_DETECTED";
/// Wire code for an expired or missing session.
pub const SESSION_EXPIRED: &str = "SESSION_EXPIRED";
/// Wire code for a missing user.
pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
/// Wire code for opaque persistence failures.
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
