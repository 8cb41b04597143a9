//! Observability for the identity service.
//!
//! # Privacy by Default
//!
//! Service and crypto functions use `#[instrument(skip_all)]` and add only
//! allow-listed fields. Fields fall into three groups:
//! - **SAFE**: logged in plaintext (outcomes, error codes, durations)
//! - **HASHED**: logged as a short SHA-256 prefix for correlation (usernames,
//!   emails)
//! - **NEVER**: must not appear in logs (passwords, salts, digests, tokens,
//!   activation codes, the signing key)

pub mod metrics;

use crate::errors::AuthnError;
use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// One-way and truncated. Good enough to follow one username through a
/// request, not meant to protect secrets.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hex = hex::encode(Sha256::digest(value.as_bytes()));
    hex.truncate(8);
    hex
}

/// Bounded error categories for metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Request failed one or more rules
    Validation,
    /// Uniqueness, missing identity, activation state
    BusinessRule,
    /// Wrong password or no local password
    Authentication,
    /// Hashing, signing, randomness
    Cryptographic,
    /// Database, misconfiguration, anything unexpected
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::BusinessRule => "business_rule",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Cryptographic => "cryptographic",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&AuthnError> for ErrorCategory {
    fn from(err: &AuthnError) -> Self {
        match err {
            AuthnError::ValidationFailed(_) => ErrorCategory::Validation,
            AuthnError::IdentityConflict(_)
            | AuthnError::NoMatch(_)
            | AuthnError::NotFound(_)
            | AuthnError::AlreadyActivated
            | AuthnError::CodeExpired => ErrorCategory::BusinessRule,
            AuthnError::InvalidCredentials => ErrorCategory::Authentication,
            AuthnError::Crypto(_) => ErrorCategory::Cryptographic,
            AuthnError::InvalidArgument(_) | AuthnError::Database(_) | AuthnError::Internal => {
                ErrorCategory::Internal
            }
        }
    }
}
