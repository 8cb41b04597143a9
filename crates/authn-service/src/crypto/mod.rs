use crate::errors::AuthnError;
use base64::{engine::general_purpose, Engine as _};
use common::jwt::IdentityClaims;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::instrument;
use uuid::Uuid;

/// Salt entropy in bytes. Encodes to 24 base64 characters.
pub const SALT_LENGTH_BYTES: usize = 16;

/// Digest a password with its salt.
///
/// The stored form is `base64(SHA-256(utf8(password || salt)))`. A missing
/// salt is treated as the empty string. Equal inputs always produce equal
/// digests.
#[instrument(skip_all)]
pub fn hash_password(password: &str, salt: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.unwrap_or_default().as_bytes());
    general_purpose::STANDARD.encode(hasher.finalize())
}

/// Recompute the digest for `password` and compare it to `expected` in
/// constant time.
#[instrument(skip_all)]
pub fn verify_password(password: &str, salt: Option<&str>, expected: &str) -> bool {
    let computed = hash_password(password, salt);
    computed.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Generate cryptographically secure random bytes
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, AuthnError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|e| AuthnError::Crypto(format!("Random bytes generation failed: {}", e)))?;
    Ok(bytes)
}

/// Fresh per-identity salt, base64 encoded.
#[instrument(skip_all)]
pub fn generate_salt() -> Result<String, AuthnError> {
    let bytes = generate_random_bytes(SALT_LENGTH_BYTES)?;
    Ok(general_purpose::STANDARD.encode(bytes))
}

/// Single-use activation code. Never nil.
pub fn generate_activation_code() -> Uuid {
    Uuid::new_v4()
}

/// Sign identity claims with HMAC-SHA256.
#[instrument(skip_all)]
pub fn sign_identity_token(
    claims: &IdentityClaims,
    signing_key: &[u8],
) -> Result<String, AuthnError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    encode(&header, claims, &EncodingKey::from_secret(signing_key))
        .map_err(|e| AuthnError::Crypto(format!("JWT signing operation failed: {}", e)))
}
