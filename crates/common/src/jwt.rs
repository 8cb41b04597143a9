//! Identity token claims shared between the issuer and token consumers.
//!
//! This module provides:
//! - The fixed claim set carried by identity tokens (`IdentityClaims`)
//! - Size and signing-key limits
//! - HS256 verification for consumers holding the shared signing key
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only HS256 is accepted; `alg` confusion is rejected by `jsonwebtoken`
//! - Generic error messages prevent information leakage
//! - `sub` and `email` are redacted in Debug output

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Checked BEFORE base64 decode and signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Minimum length, in characters, of an HMAC signing key.
///
/// Shorter keys are a caller error and are never padded.
pub const MIN_SIGNING_KEY_LENGTH: usize = 16;

/// Name of the claim carrying the serialized entitlement tags.
pub const PRIVILEGES_CLAIM: &str = "privileges";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during identity token verification.
///
/// Messages are intentionally generic. Details are logged at debug level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Signature, issuer, expiry or structure check failed.
    #[error("The access token is invalid or expired")]
    InvalidToken,

    /// The `privileges` claim is not a JSON string array.
    #[error("The access token is invalid or expired")]
    MalformedPrivileges,
}

// =============================================================================
// Claims Types
// =============================================================================

/// Claims carried by an identity token.
///
/// # Fields
///
/// - `iss`: Issuing application
/// - `sub`: Identity handle (username, or registered email for federated identities)
/// - `email`: Registered email
/// - `jti`: Random token identifier, unique per issuance
/// - `given_name` / `family_name`: Identity names
/// - `privileges`: JSON-encoded array of entitlement tags
/// - `nbf` / `iat` / `exp`: Unix epoch seconds
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityClaims {
    pub iss: String,
    pub sub: String,
    pub email: String,
    pub jti: String,
    pub given_name: String,
    pub family_name: String,
    pub privileges: String,
    pub nbf: i64,
    pub iat: i64,
    pub exp: i64,
}

impl fmt::Debug for IdentityClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityClaims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("jti", &self.jti)
            .field("privileges", &self.privileges)
            .field("nbf", &self.nbf)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish_non_exhaustive()
    }
}

impl IdentityClaims {
    /// Decode the `privileges` claim into entitlement tags.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPrivileges` if the claim is not a JSON string array.
    pub fn entitlements(&self) -> Result<Vec<String>, JwtValidationError> {
        serde_json::from_str(&self.privileges).map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to parse privileges claim");
            JwtValidationError::MalformedPrivileges
        })
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Verify an HS256 identity token and return its claims.
///
/// Validates size, signature, `iss`, `exp` and `nbf`.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `InvalidToken` - Any other verification failure
pub fn verify_identity_token(
    token: &str,
    signing_key: &[u8],
    issuer: &str,
) -> Result<IdentityClaims, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

    let token_data = decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(signing_key),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Token verification failed");
        JwtValidationError::InvalidToken
    })?;

    Ok(token_data.claims)
}
