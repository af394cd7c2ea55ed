//! Compact JWT encode/decode, sign/verify.
//!
//! Pure and stateless: no clock access, no store access. Timing checks
//! live in the claims validator. The algorithm is pinned to HS256; any
//! other `alg` in an incoming header is rejected before signature work,
//! foreclosing algorithm-confusion attacks.

use crate::error::TokenError;
use crate::jwt::claims::AccessTokenClaims;
use crate::secret::SigningKey;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::hmac;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// The only accepted signing algorithm.
pub const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

impl Header {
    fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Stateless HS256 token codec.
pub struct TokenCodec;

impl TokenCodec {
    /// Sign claims into the three-segment compact form.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::TokenFormat` if the claims fail to serialize.
    pub fn sign(claims: &AccessTokenClaims, key: &SigningKey) -> Result<String, TokenError> {
        let header = serde_json::to_vec(&Header::hs256())
            .map_err(|e| TokenError::TokenFormat(e.to_string()))?;
        let payload =
            serde_json::to_vec(claims).map_err(|e| TokenError::TokenFormat(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let tag = hmac::sign(&key.hmac_key(), signing_input.as_bytes());

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(tag.as_ref())))
    }

    /// Verify a compact token and return its claims.
    ///
    /// All failures are typed; malformed input never panics. The
    /// signature comparison is constant-time.
    ///
    /// # Errors
    ///
    /// - `TokenFormat` on wrong segment count, non-base64url segments, or
    ///   undecodable JSON;
    /// - `UnsupportedAlgorithm` when the header declares anything but
    ///   HS256 (including `none`);
    /// - `SignatureInvalid` on mismatch.
    pub fn verify(token: &str, key: &SigningKey) -> Result<AccessTokenClaims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(TokenError::TokenFormat(format!(
                "expected 3 segments, got {}",
                segments.len()
            )));
        }

        let header_bytes = URL_SAFE_NO_PAD
            .decode(segments[0])
            .map_err(|_| TokenError::TokenFormat("header is not base64url".to_string()))?;
        let header: Header = serde_json::from_slice(&header_bytes)
            .map_err(|_| TokenError::TokenFormat("header is not valid JSON".to_string()))?;

        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(segments[2])
            .map_err(|_| TokenError::TokenFormat("signature is not base64url".to_string()))?;

        let signing_input = format!("{}.{}", segments[0], segments[1]);
        let expected = hmac::sign(&key.hmac_key(), signing_input.as_bytes());
        if !bool::from(expected.as_ref().ct_eq(signature.as_slice())) {
            return Err(TokenError::SignatureInvalid);
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(segments[1])
            .map_err(|_| TokenError::TokenFormat("payload is not base64url".to_string()))?;
        serde_json::from_slice(&payload_bytes)
            .map_err(|_| TokenError::TokenFormat("payload is not a valid claims object".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::secret::SecretProvider;
    use crate::session::AuthMethod;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn test_key() -> SigningKey {
        SecretProvider::new(Environment::Test)
            .resolve("test-secret-material-for-codec-tests-0123456789")
            .unwrap()
    }

    fn test_claims() -> AccessTokenClaims {
        AccessTokenClaims::new(
            "auth-platform".to_string(),
            Uuid::new_v4(),
            "user@example.com".to_string(),
            Uuid::new_v4(),
            AuthMethod::Password,
            vec!["api".to_string()],
            Utc::now(),
            Duration::minutes(15),
        )
    }

    #[test]
    fn test_round_trip() {
        let key = test_key();
        let claims = test_claims();
        let token = TokenCodec::sign(&claims, &key).unwrap();
        let decoded = TokenCodec::verify(&token, &key).unwrap();
        assert_eq!(claims, decoded);
    }

    #[test]
    fn test_segment_count_rejected() {
        let key = test_key();
        assert!(matches!(
            TokenCodec::verify("only.two", &key),
            Err(TokenError::TokenFormat(_))
        ));
        assert!(matches!(
            TokenCodec::verify("a.b.c.d", &key),
            Err(TokenError::TokenFormat(_))
        ));
    }

    #[test]
    fn test_non_base64_segment_rejected() {
        let key = test_key();
        assert!(matches!(
            TokenCodec::verify("!!!.???.###", &key),
            Err(TokenError::TokenFormat(_))
        ));
    }

    #[test]
    fn test_algorithm_none_rejected() {
        let key = test_key();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&test_claims()).unwrap());
        let token = format!("{}.{}.", header, payload);
        assert!(matches!(
            TokenCodec::verify(&token, &key),
            Err(TokenError::UnsupportedAlgorithm(alg)) if alg == "none"
        ));
    }

    #[test]
    fn test_algorithm_rs256_rejected_even_with_valid_hmac() {
        let key = test_key();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&test_claims()).unwrap());
        let signing_input = format!("{}.{}", header, payload);
        let tag = hmac::sign(&key.hmac_key(), signing_input.as_bytes());
        let token = format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(tag.as_ref()));
        assert!(matches!(
            TokenCodec::verify(&token, &key),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let key = test_key();
        let token = TokenCodec::sign(&test_claims(), &key).unwrap();
        let mut segments: Vec<String> = token.split('.').map(String::from).collect();
        let mut other = test_claims();
        other.sub = Uuid::new_v4().to_string();
        segments[1] = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&other).unwrap());
        let forged = segments.join(".");
        assert!(matches!(
            TokenCodec::verify(&forged, &key),
            Err(TokenError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let key = test_key();
        let other_key = SecretProvider::new(Environment::Test)
            .resolve("test-a-completely-different-secret-9876543210")
            .unwrap();
        let token = TokenCodec::sign(&test_claims(), &key).unwrap();
        assert!(matches!(
            TokenCodec::verify(&token, &other_key),
            Err(TokenError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_garbage_payload_json_rejected() {
        let key = test_key();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(b"not json at all");
        let signing_input = format!("{}.{}", header, payload);
        let tag = hmac::sign(&key.hmac_key(), signing_input.as_bytes());
        let token = format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(tag.as_ref()));
        assert!(matches!(
            TokenCodec::verify(&token, &key),
            Err(TokenError::TokenFormat(_))
        ));
    }
}
