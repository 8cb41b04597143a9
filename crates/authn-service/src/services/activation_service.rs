use crate::config::RuleConfig;
use crate::errors::AuthnError;
use crate::models::ActivationRequest;
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_activation, record_error};
use crate::observability::ErrorCategory;
use crate::repositories::IdentityRepository;
use crate::services::registration_service::normalize_email;
use crate::validation::activation_validator;
use chrono::{DateTime, Utc};
use tracing::instrument;

/// Activate a pending identity with the code issued at registration.
///
/// Checks run in a fixed order: identity/code/email match, issued-at
/// present, not already active, within the activation window. The identity
/// is only mutated when every check passes.
pub async fn activate(
    repo: &dyn IdentityRepository,
    rules: &RuleConfig,
    request: &ActivationRequest,
) -> Result<(), AuthnError> {
    activate_at(repo, rules, request, Utc::now()).await
}

/// [`activate`] with an explicit activation instant.
#[instrument(skip_all, fields(username_hash = %hash_for_correlation(&request.username)))]
pub async fn activate_at(
    repo: &dyn IdentityRepository,
    rules: &RuleConfig,
    request: &ActivationRequest,
    now: DateTime<Utc>,
) -> Result<(), AuthnError> {
    match activate_inner(repo, rules, request, now).await {
        Ok(()) => {
            record_activation("activated");
            tracing::info!(target: "authn.services.activation", "Identity activated");
            Ok(())
        }
        Err(e) => {
            record_activation(outcome(&e));
            record_error("activate", ErrorCategory::from(&e).as_str());
            if e.is_unexpected() {
                tracing::error!(
                    target: "authn.services.activation",
                    error = %e,
                    error_code = e.code(),
                    "Activation failed"
                );
            } else {
                tracing::debug!(
                    target: "authn.services.activation",
                    error_code = e.code(),
                    "Activation rejected"
                );
            }
            Err(e)
        }
    }
}

async fn activate_inner(
    repo: &dyn IdentityRepository,
    rules: &RuleConfig,
    request: &ActivationRequest,
    now: DateTime<Utc>,
) -> Result<(), AuthnError> {
    activation_validator().assert_valid(request, rules)?;

    let username = request.username.trim();
    let identity = repo
        .find_by_username(username)
        .await?
        .filter(|i| {
            i.activation_code == Some(request.activation_code)
                && i.registered_email == normalize_email(&request.email)
        })
        .ok_or_else(AuthnError::no_match)?;

    let issued_on = identity
        .activation_code_issued_on
        .ok_or_else(AuthnError::no_match)?;

    if identity.is_active() {
        return Err(AuthnError::AlreadyActivated);
    }

    if now - issued_on > rules.activation_window {
        return Err(AuthnError::CodeExpired);
    }

    repo.activate_identity(username, now).await?;
    Ok(())
}

/// Bounded metrics label for a failed activation.
fn outcome(err: &AuthnError) -> &'static str {
    match err {
        AuthnError::ValidationFailed(_) => "invalid",
        AuthnError::NoMatch(_) => "no_match",
        AuthnError::AlreadyActivated => "already_activated",
        AuthnError::CodeExpired => "expired",
        _ => "error",
    }
}
