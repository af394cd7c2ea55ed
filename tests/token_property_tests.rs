//! Property-based tests for the token codec, secret policy, and claim
//! validation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use ring::hmac;
use token_lifecycle::{
    AccessTokenClaims, AuthMethod, ClaimsValidator, Config, Environment, RefreshTokenGenerator,
    SecretProvider, SigningKey, TokenCodec, TokenError,
};
use uuid::Uuid;

fn test_key() -> SigningKey {
    SecretProvider::new(Environment::Test)
        .resolve("test-secret-material-for-property-tests-01234")
        .unwrap()
}

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_email() -> impl Strategy<Value = String> {
    "[a-z]{1,12}@[a-z]{1,12}\\.com"
}

fn arb_issued_at() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
}

fn arb_claims() -> impl Strategy<Value = AccessTokenClaims> {
    (
        arb_uuid(),
        arb_email(),
        arb_uuid(),
        arb_issued_at(),
        1i64..604_800,
        prop::collection::vec("[a-z]{2,8}", 1..3),
    )
        .prop_map(|(sub, email, session_id, now, ttl, audiences)| {
            AccessTokenClaims::new(
                "auth-platform".to_string(),
                sub,
                email,
                session_id,
                AuthMethod::Password,
                audiences,
                now,
                Duration::seconds(ttl),
            )
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For all valid claims, verify(sign(c)) == c.
    #[test]
    fn prop_sign_verify_round_trip(claims in arb_claims()) {
        let key = test_key();
        let token = TokenCodec::sign(&claims, &key).unwrap();
        let decoded = TokenCodec::verify(&token, &key).unwrap();
        prop_assert_eq!(claims, decoded);
    }

    /// Any declared algorithm other than HS256 is rejected, even when
    /// the HMAC over the signing input is valid.
    #[test]
    fn prop_algorithm_pinning(
        claims in arb_claims(),
        alg in prop::sample::select(vec!["none", "RS256", "RS384", "ES256", "HS384", "PS256"]),
    ) {
        let key = test_key();
        let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"{}","typ":"JWT"}}"#, alg));
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let signing_input = format!("{}.{}", header, payload);

        // Forge a structurally valid signature with the real key; the
        // algorithm check must fire before any signature comparison.
        let base = hmac::Key::new(
            hmac::HMAC_SHA256,
            b"attacker-chosen-material-of-no-consequence",
        );
        let tag = hmac::sign(&base, signing_input.as_bytes());
        let token = format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(tag.as_ref()));

        prop_assert!(matches!(
            TokenCodec::verify(&token, &key),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
    }

    /// Dot-free strings never pass segment parsing.
    #[test]
    fn prop_wrong_segment_count_rejected(garbage in "[A-Za-z0-9_-]{0,64}") {
        let key = test_key();
        prop_assert!(matches!(
            TokenCodec::verify(&garbage, &key),
            Err(TokenError::TokenFormat(_))
        ));
    }

    /// Corrupting the payload segment always invalidates the token.
    #[test]
    fn prop_payload_tampering_detected(claims in arb_claims(), other in arb_claims()) {
        prop_assume!(claims != other);
        let key = test_key();
        let token = TokenCodec::sign(&claims, &key).unwrap();

        let segments: Vec<&str> = token.split('.').collect();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&other).unwrap());
        let forged = format!("{}.{}.{}", segments[0], forged_payload, segments[2]);

        prop_assert!(matches!(
            TokenCodec::verify(&forged, &key),
            Err(TokenError::SignatureInvalid)
        ));
    }

    /// Secrets below 32 bytes fail in every environment.
    #[test]
    fn prop_short_secrets_rejected_everywhere(secret in "[ -~]{0,31}") {
        prop_assert!(SecretProvider::new(Environment::Test).resolve(&secret).is_err());
        prop_assert!(SecretProvider::new(Environment::Development).resolve(&secret).is_err());
        prop_assert!(SecretProvider::new(Environment::Production).resolve(&secret).is_err());
    }

    /// Mid-length test-marked secrets pass outside production and fail
    /// inside it (length floor and marker both fire).
    #[test]
    fn prop_environment_isolation(body in "[A-Za-z0-9]{27,58}") {
        let secret = format!("test-{}", body);
        prop_assert!(SecretProvider::new(Environment::Test).resolve(&secret).is_ok());
        prop_assert!(SecretProvider::new(Environment::Production).resolve(&secret).is_err());
    }

    /// Deny-listed substrings disqualify production secrets regardless
    /// of length or diversity.
    #[test]
    fn prop_weak_substring_rejected_in_production(
        prefix in "[A-Za-z0-9!@#]{30,40}",
        weak in prop::sample::select(vec!["password", "qwerty", "changeme"]),
        suffix in "[A-Za-z0-9!@#]{30,40}",
    ) {
        let secret = format!("{}{}{}", prefix, weak, suffix);
        prop_assert!(SecretProvider::new(Environment::Production).resolve(&secret).is_err());
    }

    /// Bearer join/split is lossless for any id and plausible secret.
    #[test]
    fn prop_bearer_round_trip(id in arb_uuid(), secret in "[A-Za-z0-9_-]{16,64}") {
        let bearer = RefreshTokenGenerator::join_bearer(id, &secret);
        let (parsed_id, parsed_secret) = RefreshTokenGenerator::split_bearer(&bearer).unwrap();
        prop_assert_eq!(parsed_id, id);
        prop_assert_eq!(parsed_secret, secret);
    }

    /// Keyed hashing is deterministic per key and never echoes the secret.
    #[test]
    fn prop_keyed_hash_is_stable_and_opaque(secret in "[A-Za-z0-9_-]{16,64}") {
        let key = test_key();
        let h1 = RefreshTokenGenerator::hash_secret(&secret, &key);
        let h2 = RefreshTokenGenerator::hash_secret(&secret, &key);
        prop_assert_eq!(&h1, &h2);
        prop_assert!(!h1.contains(&secret));
    }

    /// Subject marker policy: unmarked subjects only verify in
    /// production, marked subjects only outside it.
    #[test]
    fn prop_subject_marker_policy(id in arb_uuid()) {
        let test_v = ClaimsValidator::new(&Config::new(Environment::Test));
        let prod_v = ClaimsValidator::new(&Config::new(Environment::Production));

        let raw = id.to_string();
        let marked = format!("7e57{}", &raw[4..]);

        prop_assume!(!raw.starts_with("7e57") && !raw.starts_with("00000000"));

        prop_assert!(prod_v.validate_subject(&raw).is_ok());
        prop_assert!(test_v.validate_subject(&raw).is_err());
        prop_assert!(test_v.validate_subject(&marked).is_ok());
        prop_assert!(prod_v.validate_subject(&marked).is_err());
    }

    /// Production jti acceptance tracks hex-digit diversity.
    #[test]
    fn prop_jti_entropy_floor(id in arb_uuid()) {
        let prod_v = ClaimsValidator::new(&Config::new(Environment::Production));

        let hex = id.simple().to_string();
        let mut digits: Vec<char> = hex.chars().collect();
        digits.sort_unstable();
        digits.dedup();
        let expect_ok = digits.len() >= 6;

        prop_assert_eq!(prod_v.validate_jti(&id.to_string()).is_ok(), expect_ok);
    }
}
