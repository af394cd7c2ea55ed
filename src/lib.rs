//! Token lifecycle engine.
//!
//! Issues, verifies, and rotates short-lived access tokens (HS256 JWTs)
//! and long-lived single-use refresh tokens, detects refresh token reuse,
//! and responds with family-wide revocation. Persistence and audit
//! logging are consumed through narrow interfaces; this crate assumes an
//! already-authenticated principal and manages only the token/session
//! lifecycle that follows.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod issuer;
pub mod jwt;
pub mod refresh;
pub mod secret;
pub mod session;
pub mod store;

// Re-exports for convenience
pub use audit::{AuditEvent, AuditSeverity, AuditSink, NullAuditSink, TracingAuditSink};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, Environment};
pub use error::TokenError;
pub use issuer::{TokenIssuer, TokenPair};
pub use jwt::{AccessTokenClaims, ClaimsValidator, TokenCodec};
pub use refresh::{RefreshTokenGenerator, RefreshTokenRecord, RefreshTokenState, RotationEngine};
pub use secret::{SecretProvider, SigningKey};
pub use session::{AuthMethod, Session, UserProfile};
pub use store::{InMemoryStore, RotationUpdate, SessionStore};
