use chrono::{DateTime, Utc};
use common::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A registered account, active or pending.
///
/// Invariants (enforced by the identity rule set and the repository):
/// - `username` and `registered_email` are globally unique
/// - `password_salt` and `password_hash` are both present or both absent;
///   absent means the identity was created through a federated path
/// - `activation_code` and `activation_code_issued_on` are both present or
///   both absent
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub identity_id: Uuid,
    pub username: Option<String>,
    pub registered_email: String,
    pub password_salt: Option<String>,
    pub password_hash: Option<String>,
    pub forename: String,
    pub surname: String,
    pub federated_id: Option<String>,
    pub created_on: DateTime<Utc>,
    pub activated_on: Option<DateTime<Utc>>,
    pub activation_code: Option<Uuid>,
    pub activation_code_issued_on: Option<DateTime<Utc>>,
    pub entitlements: Vec<String>,
}

impl Identity {
    /// An identity with an activation timestamp is active.
    pub fn is_active(&self) -> bool {
        self.activated_on.is_some()
    }

    /// Stable handle used as the token subject.
    ///
    /// Federated identities may have no username; their registered email
    /// stands in.
    pub fn handle(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.registered_email)
    }
}

/// Custom Debug implementation that redacts credential material.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("identity_id", &self.identity_id)
            .field("username", &self.username)
            .field("registered_email", &self.registered_email)
            .field("password_salt", &self.password_salt.as_ref().map(|_| "[REDACTED]"))
            .field("password_hash", &self.password_hash.as_ref().map(|_| "[REDACTED]"))
            .field("forename", &self.forename)
            .field("surname", &self.surname)
            .field("federated_id", &self.federated_id)
            .field("created_on", &self.created_on)
            .field("activated_on", &self.activated_on)
            .field("activation_code", &self.activation_code)
            .field("activation_code_issued_on", &self.activation_code_issued_on)
            .field("entitlements", &self.entitlements)
            .finish()
    }
}

/// Caller-facing view of an identity. Never carries credential material
/// or the activation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySnapshot {
    pub identity_id: Uuid,
    pub username: Option<String>,
    pub registered_email: String,
    pub forename: String,
    pub surname: String,
    pub created_on: DateTime<Utc>,
    pub activated_on: Option<DateTime<Utc>>,
    pub entitlements: Vec<String>,
}

impl IdentitySnapshot {
    pub fn handle(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.registered_email)
    }
}

impl From<&Identity> for IdentitySnapshot {
    fn from(identity: &Identity) -> Self {
        Self {
            identity_id: identity.identity_id,
            username: identity.username.clone(),
            registered_email: identity.registered_email.clone(),
            forename: identity.forename.clone(),
            surname: identity.surname.clone(),
            created_on: identity.created_on,
            activated_on: identity.activated_on,
            entitlements: identity.entitlements.clone(),
        }
    }
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

/// Request to register a new identity. Activation is required afterwards.
///
/// Missing fields deserialize as empty so that validation reports every
/// problem at once.
#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "empty_secret")]
    pub password: SecretString,
    #[serde(default)]
    pub forename: String,
    #[serde(default)]
    pub surname: String,
}

/// Successful registration: the activation code and when it stops working.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationSuccess {
    pub activation_code: Uuid,
    pub expires_on: DateTime<Utc>,
}

/// Request to activate a pending identity, typically from an emailed link.
///
/// A missing activation code deserializes to the nil UUID, which the
/// activation rules treat as absent.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivationRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub activation_code: Uuid,
}

/// Request to log in with a password and exactly one of username or email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "empty_secret")]
    pub password: SecretString,
    /// Requested token lifetime, in seconds.
    #[serde(default)]
    pub duration: Option<i64>,
}

/// A signed token, its expiry, and the identity it was issued for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub token_expires_on: DateTime<Utc>,
    pub user: IdentitySnapshot,
}
