//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for identity tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use common::jwt::verify_identity_token;
use serde::Deserialize;
use serde_json::Value;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

fn decode_segment(token: &str, index: usize) -> Vec<u8> {
    let segment = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT is missing segment {}", index));
    URL_SAFE_NO_PAD
        .decode(segment)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT segment {}: {}", index, e))
}

fn payload(token: &str) -> Value {
    serde_json::from_slice(&decode_segment(token, 1)).expect("Failed to parse JWT claims")
}

/// Custom assertions for identity tokens
///
/// # Example
/// ```rust,ignore
/// issued.token
///     .assert_valid_jwt()
///     .assert_for_subject("bobsmith")
///     .assert_expires_in(300);
/// ```
pub trait TokenAssertions {
    /// Assert that the token is a well-formed HS256 JWT
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that the token verifies with the given key and issuer
    fn assert_verifies_with(&self, signing_key: &str, issuer: &str) -> &Self;

    /// Assert that the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert that the token carries the specified email claim
    fn assert_for_email(&self, email: &str) -> &Self;

    /// Assert that the token lifetime (exp - iat) is exactly `seconds`
    fn assert_expires_in(&self, seconds: i64) -> &Self;

    /// Assert that the privileges claim lists the entitlement
    fn assert_has_privilege(&self, tag: &str) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts
        );

        let header: JwtHeader = serde_json::from_slice(&decode_segment(self, 0))
            .expect("Failed to parse JWT header JSON");
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        let claims = payload(self);
        for claim in ["iss", "sub", "email", "jti", "nbf", "iat", "exp"] {
            assert!(
                claims.get(claim).is_some(),
                "JWT claims missing '{}': {}",
                claim,
                claims
            );
        }

        self
    }

    fn assert_verifies_with(&self, signing_key: &str, issuer: &str) -> &Self {
        let result = verify_identity_token(self, signing_key.as_bytes(), issuer);
        assert!(
            result.is_ok(),
            "Token failed verification: {:?}",
            result.err()
        );
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = payload(self);
        assert_eq!(
            claims["sub"].as_str(),
            Some(subject),
            "Expected subject '{}', got {}",
            subject,
            claims["sub"]
        );
        self
    }

    fn assert_for_email(&self, email: &str) -> &Self {
        let claims = payload(self);
        assert_eq!(
            claims["email"].as_str(),
            Some(email),
            "Expected email '{}', got {}",
            email,
            claims["email"]
        );
        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let claims = payload(self);
        let iat = claims["iat"].as_i64().expect("iat must be a number");
        let exp = claims["exp"].as_i64().expect("exp must be a number");
        assert_eq!(
            exp - iat,
            seconds,
            "Expected token lifetime {}s, got {}s",
            seconds,
            exp - iat
        );
        self
    }

    fn assert_has_privilege(&self, tag: &str) -> &Self {
        let claims = payload(self);
        let raw = claims["privileges"]
            .as_str()
            .expect("privileges claim must be a JSON-encoded string");
        let privileges: Vec<String> =
            serde_json::from_str(raw).expect("privileges claim must encode a string array");
        assert!(
            privileges.iter().any(|p| p == tag),
            "Token does not carry privilege '{}'. Available: {:?}",
            tag,
            privileges
        );
        self
    }
}
