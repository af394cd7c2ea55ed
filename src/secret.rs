//! Environment-aware signing secret resolution.
//!
//! Each environment gets its own validated, isolated key material
//! instance. Validation reports reason codes only; the secret value is
//! never logged or echoed into error messages.

use crate::config::Environment;
use crate::error::TokenError;
use ring::hmac;
use std::env;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Minimum secret length outside production, in bytes.
const MIN_SECRET_LEN: usize = 32;
/// Minimum secret length in production, in bytes.
const MIN_SECRET_LEN_PRODUCTION: usize = 64;

/// Substrings that disqualify a production secret outright.
const WEAK_SUBSTRINGS: &[&str] = &["password", "123", "abc", "secret", "changeme", "qwerty"];

/// Prefixes marking a secret as test-grade material.
const TEST_SECRET_PREFIXES: &[&str] = &["test-", "dev-", "insecure-"];

/// Prefix marking a secret as production material.
const PRODUCTION_SECRET_PREFIX: &str = "prod-";

/// Environment variable holding the signing secret.
pub const SECRET_ENV_VAR: &str = "TOKEN_SIGNING_SECRET";

/// Validated HMAC key material, tagged with the environment it was
/// resolved for. Zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SigningKey {
    #[zeroize(skip)]
    environment: Environment,
    material: Vec<u8>,
}

impl SigningKey {
    /// Environment this key was validated for.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// HMAC key for JWT signatures.
    pub(crate) fn hmac_key(&self) -> hmac::Key {
        hmac::Key::new(hmac::HMAC_SHA256, &self.material)
    }

    /// Keyed-hash key for refresh token secrets, derived from the signing
    /// key with a domain-separation label so the two uses never share a
    /// key directly.
    pub(crate) fn refresh_hash_key(&self) -> hmac::Key {
        let base = hmac::Key::new(hmac::HMAC_SHA256, &self.material);
        let derived = hmac::sign(&base, b"refresh-token-hash");
        hmac::Key::new(hmac::HMAC_SHA256, derived.as_ref())
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("environment", &self.environment)
            .field("material", &"<redacted>")
            .finish()
    }
}

/// Resolves and validates the signing secret for one environment.
#[derive(Debug, Clone, Copy)]
pub struct SecretProvider {
    environment: Environment,
}

impl SecretProvider {
    /// Create a provider for the given environment.
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    /// Resolve the secret from [`SECRET_ENV_VAR`].
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Config` if the variable is absent or the
    /// secret fails validation.
    pub fn resolve_env(&self) -> Result<SigningKey, TokenError> {
        let raw = env::var(SECRET_ENV_VAR)
            .map_err(|_| TokenError::config(format!("{} is not set", SECRET_ENV_VAR)))?;
        self.resolve(&raw)
    }

    /// Validate a raw secret and produce isolated key material.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Config` with a reason code when the secret is
    /// too short for the environment, matches the weak-substring deny
    /// list, lacks character-class diversity (production), or carries a
    /// marker for the wrong environment.
    pub fn resolve(&self, raw: &str) -> Result<SigningKey, TokenError> {
        let minimum = if self.environment.is_production() {
            MIN_SECRET_LEN_PRODUCTION
        } else {
            MIN_SECRET_LEN
        };
        if raw.len() < minimum {
            return Err(TokenError::config(format!(
                "signing secret below minimum length for {} ({} bytes required)",
                self.environment.as_str(),
                minimum
            )));
        }

        let lowered = raw.to_lowercase();
        let test_marked = TEST_SECRET_PREFIXES.iter().any(|p| lowered.starts_with(p));
        let production_marked = lowered.starts_with(PRODUCTION_SECRET_PREFIX);

        if self.environment.is_production() {
            if test_marked {
                return Err(TokenError::config(
                    "test-marked signing secret rejected in production",
                ));
            }
            if let Some(weak) = WEAK_SUBSTRINGS.iter().find(|w| lowered.contains(*w)) {
                return Err(TokenError::config(format!(
                    "production signing secret matches deny list ({})",
                    weak
                )));
            }
            if character_classes(raw) < 3 {
                return Err(TokenError::config(
                    "production signing secret lacks character-class diversity",
                ));
            }
        } else if production_marked {
            return Err(TokenError::config(format!(
                "production-marked signing secret rejected in {}",
                self.environment.as_str()
            )));
        }

        // Copy into an owned buffer so each environment holds its own
        // key material instance.
        Ok(SigningKey {
            environment: self.environment,
            material: raw.as_bytes().to_vec(),
        })
    }
}

/// Count character classes present: lowercase, uppercase, digit, symbol.
fn character_classes(s: &str) -> usize {
    let mut lower = false;
    let mut upper = false;
    let mut digit = false;
    let mut symbol = false;
    for c in s.chars() {
        if c.is_ascii_lowercase() {
            lower = true;
        } else if c.is_ascii_uppercase() {
            upper = true;
        } else if c.is_ascii_digit() {
            digit = true;
        } else {
            symbol = true;
        }
    }
    usize::from(lower) + usize::from(upper) + usize::from(digit) + usize::from(symbol)
}
