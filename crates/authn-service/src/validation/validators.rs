//! Rule sets per subject type.

use super::rules::{
    BothOrNeither, EmailAddress, ExactlyOne, Field, InclusiveBetween, LengthBetween, NotBlank,
    NotNil, PasswordComplexity,
};
use super::{Validator, Violation};
use crate::config::{RuleConfig, MIN_REQUESTED_TOKEN_SECONDS};
use crate::models::{ActivationRequest, Identity, LoginRequest, RegistrationRequest};
use common::secret::ExposeSecret;

pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 512;
pub const MAX_PASSWORD_LENGTH: usize = 512;
pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 50;
pub const MIN_CREDENTIAL_LENGTH: usize = 16;
pub const MAX_CREDENTIAL_LENGTH: usize = 512;

fn min_username(config: &RuleConfig) -> usize {
    config.min_username_length
}

fn min_email(config: &RuleConfig) -> usize {
    config.min_email_length
}

fn min_password(config: &RuleConfig) -> usize {
    config.min_password_length
}

fn min_name(_: &RuleConfig) -> usize {
    MIN_NAME_LENGTH
}

fn min_credential(_: &RuleConfig) -> usize {
    MIN_CREDENTIAL_LENGTH
}

/// Treat whitespace-only optionals as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Username: required, configured minimum to 50 characters.
fn username_rules<T: 'static>(field: Field<T>) -> Validator<T> {
    Validator::new()
        .rule(NotBlank(field))
        .rule(LengthBetween::new(field, min_username, MAX_USERNAME_LENGTH))
}

/// Email: required, well-formed, configured minimum to 512 characters.
fn email_rules<T: 'static>(field: Field<T>) -> Validator<T> {
    Validator::new()
        .rule(NotBlank(field))
        .rule(EmailAddress(field))
        .rule(LengthBetween::new(field, min_email, MAX_EMAIL_LENGTH))
}

/// Password: required, length-bounded, sufficiently complex.
fn password_rules<T: 'static>(field: Field<T>) -> Validator<T> {
    Validator::new()
        .rule(NotBlank(field))
        .rule(LengthBetween::new(field, min_password, MAX_PASSWORD_LENGTH))
        .rule(PasswordComplexity(field))
}

fn name_rules<T: 'static>(field: Field<T>) -> Validator<T> {
    Validator::new()
        .rule(NotBlank(field))
        .rule(LengthBetween::new(field, min_name, MAX_NAME_LENGTH))
}

pub fn registration_validator() -> Validator<RegistrationRequest> {
    username_rules(Field::new("username", "Username", |r: &RegistrationRequest| {
        Some(r.username.as_str())
    }))
    .then(email_rules(Field::new(
        "email",
        "Email",
        |r: &RegistrationRequest| Some(r.email.as_str()),
    )))
    .then(password_rules(Field::secret(
        "password",
        "Password",
        |r: &RegistrationRequest| Some(r.password.expose_secret()),
    )))
    .then(name_rules(Field::new(
        "forename",
        "Forename",
        |r: &RegistrationRequest| Some(r.forename.as_str()),
    )))
    .then(name_rules(Field::new(
        "surname",
        "Surname",
        |r: &RegistrationRequest| Some(r.surname.as_str()),
    )))
}

pub fn activation_validator() -> Validator<ActivationRequest> {
    username_rules(Field::new("username", "Username", |r: &ActivationRequest| {
        Some(r.username.as_str())
    }))
    .then(email_rules(Field::new(
        "email",
        "Email",
        |r: &ActivationRequest| Some(r.email.as_str()),
    )))
    .rule(NotNil {
        name: "activation_code",
        label: "Activation Code",
        get: |r: &ActivationRequest| r.activation_code,
    })
}

pub fn login_validator() -> Validator<LoginRequest> {
    let username = Field::new("username", "Username", |r: &LoginRequest| {
        present(&r.username)
    });
    let email = Field::new("email", "Email", |r: &LoginRequest| present(&r.email));
    let password = Field::secret("password", "Password", |r: &LoginRequest| {
        Some(r.password.expose_secret())
    });

    // Password strength is checked at registration only
    Validator::new()
        .rule(ExactlyOne {
            first: username,
            second: email,
        })
        .rule(LengthBetween::new(username, min_username, MAX_USERNAME_LENGTH))
        .rule(EmailAddress(email))
        .rule(LengthBetween::new(email, min_email, MAX_EMAIL_LENGTH))
        .rule(NotBlank(password))
        .rule(LengthBetween::new(password, |_| 0, MAX_PASSWORD_LENGTH))
        .rule(InclusiveBetween {
            name: "duration",
            label: "Duration",
            get: |r: &LoginRequest| r.duration,
            min: |_| i64::from(MIN_REQUESTED_TOKEN_SECONDS),
            max: |c| i64::from(c.max_token_seconds),
        })
}

/// Rules for a persisted identity record.
pub fn identity_validator() -> Validator<Identity> {
    let username = Field::new("username", "Username", |i: &Identity| i.username.as_deref());
    let email = Field::new("registered_email", "Registered Email", |i: &Identity| {
        Some(i.registered_email.as_str())
    });
    let salt = Field::secret("password_salt", "Password Salt", |i: &Identity| {
        i.password_salt.as_deref()
    });
    let hash = Field::secret("password_hash", "Password Hash", |i: &Identity| {
        i.password_hash.as_deref()
    });

    Validator::new()
        .rule(LengthBetween::new(username, min_username, MAX_USERNAME_LENGTH))
        .rule(NotBlank(email))
        .rule(LengthBetween::new(email, min_email, MAX_EMAIL_LENGTH))
        .rule(BothOrNeither {
            first: ("password_salt", "Password Salt"),
            second: ("password_hash", "Password Hash"),
            present: |i: &Identity| (i.password_salt.is_some(), i.password_hash.is_some()),
        })
        .rule(LengthBetween::new(salt, min_credential, MAX_CREDENTIAL_LENGTH))
        .rule(LengthBetween::new(hash, min_credential, MAX_CREDENTIAL_LENGTH))
        .rule(|i: &Identity, _: &RuleConfig| {
            if i.password_hash.is_none() && i.username.is_none() && i.federated_id.is_none() {
                vec![Violation::new(
                    "federated_id",
                    "An identity without a local password must be linked to a federated provider or have a username.",
                    None,
                )]
            } else {
                vec![]
            }
        })
        .then(name_rules(Field::new("forename", "Forename", |i: &Identity| {
            Some(i.forename.as_str())
        })))
        .then(name_rules(Field::new("surname", "Surname", |i: &Identity| {
            Some(i.surname.as_str())
        })))
        .rule(BothOrNeither {
            first: ("activation_code", "Activation Code"),
            second: ("activation_code_issued_on", "Activation Code Issued On"),
            present: |i: &Identity| {
                (
                    i.activation_code.is_some(),
                    i.activation_code_issued_on.is_some(),
                )
            },
        })
}
