use crate::crypto;
use crate::errors::AuthnError;
use crate::models::{IdentitySnapshot, IssuedToken};
use crate::observability::metrics::record_token_issuance;
use chrono::{DateTime, Duration, Utc};
use common::jwt::{IdentityClaims, MIN_SIGNING_KEY_LENGTH};
use common::secret::{ExposeSecret, SecretString};
use tracing::instrument;
use uuid::Uuid;

/// Issue a signed identity token valid from now for `lifetime_seconds`.
///
/// # Errors
///
/// - `InvalidArgument` if the issuer is blank, the signing key is shorter
///   than 16 characters, or the lifetime is zero
/// - `Crypto` if signing fails
pub fn issue_token(
    identity: &IdentitySnapshot,
    lifetime_seconds: u32,
    signing_key: &SecretString,
    issuer: &str,
) -> Result<IssuedToken, AuthnError> {
    issue_token_at(identity, lifetime_seconds, signing_key, issuer, Utc::now())
}

/// [`issue_token`] with an explicit issuance instant.
#[instrument(skip_all, fields(lifetime_seconds = lifetime_seconds))]
pub fn issue_token_at(
    identity: &IdentitySnapshot,
    lifetime_seconds: u32,
    signing_key: &SecretString,
    issuer: &str,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthnError> {
    let result = sign(identity, lifetime_seconds, signing_key, issuer, now);
    record_token_issuance(if result.is_ok() { "success" } else { "error" });
    result
}

fn sign(
    identity: &IdentitySnapshot,
    lifetime_seconds: u32,
    signing_key: &SecretString,
    issuer: &str,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthnError> {
    if issuer.trim().is_empty() {
        return Err(AuthnError::InvalidArgument(
            "Token issuer must not be blank".to_string(),
        ));
    }

    let key = signing_key.expose_secret();
    let key_length = key.chars().count();
    if key_length < MIN_SIGNING_KEY_LENGTH {
        return Err(AuthnError::InvalidArgument(format!(
            "Signing key must be at least {} characters, got {}",
            MIN_SIGNING_KEY_LENGTH, key_length
        )));
    }

    if lifetime_seconds == 0 {
        return Err(AuthnError::InvalidArgument(
            "Token lifetime must be greater than zero".to_string(),
        ));
    }

    let privileges = serde_json::to_string(&identity.entitlements).map_err(|e| {
        tracing::error!(target: "authn.services.token", error = %e, "Failed to encode privileges");
        AuthnError::Internal
    })?;

    let expires_on = now + Duration::seconds(i64::from(lifetime_seconds));
    let claims = IdentityClaims {
        iss: issuer.to_string(),
        sub: identity.handle().to_string(),
        email: identity.registered_email.clone(),
        jti: Uuid::new_v4().to_string(),
        given_name: identity.forename.clone(),
        family_name: identity.surname.clone(),
        privileges,
        nbf: now.timestamp(),
        iat: now.timestamp(),
        exp: expires_on.timestamp(),
    };

    let token = crypto::sign_identity_token(&claims, key.as_bytes())?;

    tracing::debug!(
        target: "authn.services.token",
        expires_on = %expires_on,
        "Identity token issued"
    );

    Ok(IssuedToken {
        token,
        token_expires_on: expires_on,
        user: identity.clone(),
    })
}
