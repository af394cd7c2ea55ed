//! Refresh token secret generation and keyed hashing.
//!
//! The bearer form is `"{record_id}.{secret}"`: the id is never secret
//! and the secret is never persisted, only its keyed hash.

use crate::error::TokenError;
use crate::secret::SigningKey;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use ring::hmac;
use uuid::Uuid;

/// Secret component length in raw bytes.
pub const SECRET_LEN: usize = 32;

/// Generates and hashes refresh token secrets.
pub struct RefreshTokenGenerator;

impl RefreshTokenGenerator {
    /// Generate a fresh high-entropy secret from the OS CSPRNG.
    #[must_use]
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; SECRET_LEN];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Keyed one-way hash of the secret component.
    ///
    /// Keyed by material derived from the signing key, so hashes from
    /// different environments are unlinkable.
    #[must_use]
    pub fn hash_secret(secret: &str, key: &SigningKey) -> String {
        let tag = hmac::sign(&key.refresh_hash_key(), secret.as_bytes());
        URL_SAFE_NO_PAD.encode(tag.as_ref())
    }

    /// Join a record id and secret into the bearer form.
    #[must_use]
    pub fn join_bearer(id: Uuid, secret: &str) -> String {
        format!("{}.{}", id, secret)
    }

    /// Split a presented bearer token into id and secret.
    ///
    /// # Errors
    ///
    /// `TokenError::InvalidToken` on any malformation; the error does not
    /// reveal which part was wrong.
    pub fn split_bearer(token: &str) -> Result<(Uuid, &str), TokenError> {
        let (id_part, secret) = token.split_once('.').ok_or(TokenError::InvalidToken)?;
        let id = Uuid::parse_str(id_part).map_err(|_| TokenError::InvalidToken)?;
        if secret.is_empty() {
            return Err(TokenError::InvalidToken);
        }
        Ok((id, secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::secret::SecretProvider;

    fn test_key() -> SigningKey {
        SecretProvider::new(Environment::Test)
            .resolve("test-secret-material-for-generator-tests-01234")
            .unwrap()
    }

    #[test]
    fn test_secrets_are_unique() {
        let s1 = RefreshTokenGenerator::generate_secret();
        let s2 = RefreshTokenGenerator::generate_secret();
        assert_ne!(s1, s2);
        assert_eq!(s1.len(), 43); // base64url of 32 bytes, no padding
    }

    #[test]
    fn test_hash_is_deterministic_and_keyed() {
        let key = test_key();
        let other_key = SecretProvider::new(Environment::Test)
            .resolve("test-a-different-secret-material-987654321000")
            .unwrap();

        let secret = RefreshTokenGenerator::generate_secret();
        assert_eq!(
            RefreshTokenGenerator::hash_secret(&secret, &key),
            RefreshTokenGenerator::hash_secret(&secret, &key)
        );
        assert_ne!(
            RefreshTokenGenerator::hash_secret(&secret, &key),
            RefreshTokenGenerator::hash_secret(&secret, &other_key)
        );
    }

    #[test]
    fn test_bearer_round_trip() {
        let id = Uuid::new_v4();
        let secret = RefreshTokenGenerator::generate_secret();
        let bearer = RefreshTokenGenerator::join_bearer(id, &secret);

        let (parsed_id, parsed_secret) = RefreshTokenGenerator::split_bearer(&bearer).unwrap();
        assert_eq!(parsed_id, id);
        assert_eq!(parsed_secret, secret);
    }

    #[test]
    fn test_malformed_bearer_rejected() {
        assert!(RefreshTokenGenerator::split_bearer("no-separator").is_err());
        assert!(RefreshTokenGenerator::split_bearer("not-a-uuid.secret").is_err());
        let id = Uuid::new_v4();
        assert!(RefreshTokenGenerator::split_bearer(&format!("{}.", id)).is_err());
    }
}
