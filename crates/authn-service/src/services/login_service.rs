use crate::config::{RuleConfig, TokenConfig, MIN_REQUESTED_TOKEN_SECONDS};
use crate::crypto;
use crate::errors::AuthnError;
use crate::models::{IdentitySnapshot, IssuedToken, LoginRequest};
use crate::observability::metrics::{record_error, record_login};
use crate::observability::{hash_for_correlation, ErrorCategory};
use crate::repositories::IdentityRepository;
use crate::services::registration_service::normalize_email;
use crate::services::token_service;
use crate::validation::login_validator;
use chrono::{DateTime, Utc};
use common::secret::ExposeSecret;
use std::time::Instant;
use tracing::instrument;

/// Pick the token lifetime for a login.
///
/// The requested duration wins when it lies within
/// `MIN_REQUESTED_TOKEN_SECONDS..=max_token_seconds`; anything else falls
/// back to the configured default.
pub fn resolve_lifetime(requested: Option<i64>, default_seconds: u32, max_seconds: u32) -> u32 {
    requested
        .filter(|d| (i64::from(MIN_REQUESTED_TOKEN_SECONDS)..=i64::from(max_seconds)).contains(d))
        .and_then(|d| u32::try_from(d).ok())
        .unwrap_or(default_seconds)
}

/// Authenticate with a password and issue an identity token.
///
/// Never mutates the identity.
pub async fn login(
    repo: &dyn IdentityRepository,
    rules: &RuleConfig,
    token: &TokenConfig,
    request: &LoginRequest,
) -> Result<IssuedToken, AuthnError> {
    login_at(repo, rules, token, request, Utc::now()).await
}

/// [`login`] with an explicit login instant.
#[instrument(skip_all)]
pub async fn login_at(
    repo: &dyn IdentityRepository,
    rules: &RuleConfig,
    token: &TokenConfig,
    request: &LoginRequest,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthnError> {
    let start = Instant::now();
    let result = login_inner(repo, rules, token, request, now).await;

    match &result {
        Ok(_) => {
            record_login("success", start.elapsed());
            tracing::info!(target: "authn.services.login", "Login succeeded");
        }
        Err(e) => {
            record_login("error", start.elapsed());
            record_error("login", ErrorCategory::from(e).as_str());
            if e.is_unexpected() {
                tracing::error!(
                    target: "authn.services.login",
                    error = %e,
                    error_code = e.code(),
                    "Login failed"
                );
            } else {
                tracing::debug!(
                    target: "authn.services.login",
                    error_code = e.code(),
                    "Login rejected"
                );
            }
        }
    }

    result
}

async fn login_inner(
    repo: &dyn IdentityRepository,
    rules: &RuleConfig,
    token: &TokenConfig,
    request: &LoginRequest,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthnError> {
    login_validator().assert_valid(request, rules)?;

    let username = request
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    let identity = match username {
        Some(username) => {
            tracing::debug!(
                target: "authn.services.login",
                username_hash = %hash_for_correlation(username),
                "Looking up identity by username"
            );
            repo.find_by_username(username).await?
        }
        None => {
            let email = normalize_email(request.email.as_deref().unwrap_or_default());
            tracing::debug!(
                target: "authn.services.login",
                email_hash = %hash_for_correlation(&email),
                "Looking up identity by email"
            );
            repo.find_by_email(&email).await?
        }
    }
    .ok_or_else(AuthnError::not_found)?;

    // Federated identities have no local password to check
    let stored_hash = identity
        .password_hash
        .as_deref()
        .ok_or(AuthnError::InvalidCredentials)?;

    if !crypto::verify_password(
        request.password.expose_secret(),
        identity.password_salt.as_deref(),
        stored_hash,
    ) {
        return Err(AuthnError::InvalidCredentials);
    }

    let lifetime = resolve_lifetime(
        request.duration,
        token.default_lifetime_seconds,
        rules.max_token_seconds,
    );

    token_service::issue_token_at(
        &IdentitySnapshot::from(&identity),
        lifetime,
        &token.signing_key,
        &token.issuer,
        now,
    )
}
