use crate::config::RuleConfig;
use crate::crypto;
use crate::errors::AuthnError;
use crate::models::{Identity, RegistrationRequest, RegistrationSuccess};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_error, record_registration};
use crate::observability::ErrorCategory;
use crate::repositories::{IdentityRepository, RepositoryError, UniqueField};
use crate::validation::{identity_validator, registration_validator};
use chrono::{DateTime, Utc};
use common::secret::{ExposeSecret, SecretString};
use tracing::instrument;
use uuid::Uuid;

/// Lowercase and trim an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register a new pending identity and return its activation code.
///
/// Nothing is stored if validation or either uniqueness pre-check fails.
pub async fn register(
    repo: &dyn IdentityRepository,
    rules: &RuleConfig,
    request: &RegistrationRequest,
) -> Result<RegistrationSuccess, AuthnError> {
    register_at(repo, rules, request, Utc::now()).await
}

/// [`register`] with an explicit registration instant.
#[instrument(skip_all, fields(username_hash = %hash_for_correlation(&request.username)))]
pub async fn register_at(
    repo: &dyn IdentityRepository,
    rules: &RuleConfig,
    request: &RegistrationRequest,
    now: DateTime<Utc>,
) -> Result<RegistrationSuccess, AuthnError> {
    match register_inner(repo, rules, request, now).await {
        Ok(success) => {
            record_registration("success");
            tracing::info!(target: "authn.services.registration", "Identity registered");
            Ok(success)
        }
        Err(e) => {
            record_registration("error");
            record_error("register", ErrorCategory::from(&e).as_str());
            if e.is_unexpected() {
                tracing::error!(
                    target: "authn.services.registration",
                    error = %e,
                    error_code = e.code(),
                    "Registration failed"
                );
            } else {
                tracing::debug!(
                    target: "authn.services.registration",
                    error_code = e.code(),
                    "Registration rejected"
                );
            }
            Err(e)
        }
    }
}

async fn register_inner(
    repo: &dyn IdentityRepository,
    rules: &RuleConfig,
    request: &RegistrationRequest,
    now: DateTime<Utc>,
) -> Result<RegistrationSuccess, AuthnError> {
    let request = normalized(request);
    registration_validator().assert_valid(&request, rules)?;

    if let Some(existing) = repo.find_by_email(&request.email).await? {
        return Err(conflict("email", &existing));
    }
    if let Some(existing) = repo.find_by_username(&request.username).await? {
        return Err(conflict("username", &existing));
    }

    let activation_code = crypto::generate_activation_code();
    let salt = crypto::generate_salt()?;
    let password_hash = crypto::hash_password(request.password.expose_secret(), Some(&salt));

    let identity = Identity {
        identity_id: Uuid::new_v4(),
        username: Some(request.username),
        registered_email: request.email,
        password_salt: Some(salt),
        password_hash: Some(password_hash),
        forename: request.forename,
        surname: request.surname,
        federated_id: None,
        created_on: now,
        activated_on: None,
        activation_code: Some(activation_code),
        activation_code_issued_on: Some(now),
        entitlements: Vec::new(),
    };

    identity_validator().assert_valid(&identity, rules)?;

    // A concurrent registration may win between the checks above and this
    // insert; the repository reports that as a conflict.
    match repo.add_identity(&identity).await {
        Ok(()) => {}
        Err(RepositoryError::Conflict { field }) => {
            return Err(insert_conflict(repo, field, &identity).await);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(RegistrationSuccess {
        activation_code,
        expires_on: now + rules.activation_window,
    })
}

/// The request as it will be stored: trimmed names, normalized email.
/// The password is kept verbatim.
fn normalized(request: &RegistrationRequest) -> RegistrationRequest {
    RegistrationRequest {
        username: request.username.trim().to_string(),
        email: normalize_email(&request.email),
        password: SecretString::from(request.password.expose_secret().to_string()),
        forename: request.forename.trim().to_string(),
        surname: request.surname.trim().to_string(),
    }
}

fn conflict(field: &str, existing: &Identity) -> AuthnError {
    let message = if existing.is_active() {
        format!("This {} is taken", field)
    } else {
        format!("This {} is awaiting activation", field)
    };
    AuthnError::IdentityConflict(message)
}

/// Conflict message for an identity that won the insert race.
///
/// The winner is re-read so the message reflects its state; if it cannot be
/// read it was inserted moments ago and is still pending.
async fn insert_conflict(
    repo: &dyn IdentityRepository,
    field: UniqueField,
    identity: &Identity,
) -> AuthnError {
    let winner = match field {
        UniqueField::Username => {
            repo.find_by_username(identity.username.as_deref().unwrap_or_default())
                .await
        }
        UniqueField::Email => repo.find_by_email(&identity.registered_email).await,
    };

    match winner {
        Ok(Some(existing)) => conflict(&field.to_string(), &existing),
        Ok(None) => AuthnError::IdentityConflict(format!(
            "This {} is awaiting activation",
            field
        )),
        Err(e) => {
            tracing::warn!(
                target: "authn.services.registration",
                error = %e,
                "Failed to re-read conflicting identity"
            );
            AuthnError::IdentityConflict(format!("This {} is awaiting activation", field))
        }
    }
}
