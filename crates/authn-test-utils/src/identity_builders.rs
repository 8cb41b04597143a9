//! Builder patterns for test data construction
//!
//! Provides fluent APIs for stored identities, request bodies, and the
//! service configuration used by tests.

use crate::test_ids::*;
use authn_service::config::Config;
use authn_service::crypto;
use authn_service::models::Identity;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Fixed salt for stored fixtures, 16 bytes base64-encoded.
pub const TEST_SALT: &str = "q83vEjRWeJASNFZ4kBI0Vg==";

/// Service configuration with test token settings and default rules.
pub fn test_config() -> Config {
    test_config_with(&[])
}

/// [`test_config`] with extra environment-style overrides,
/// e.g. `("ACTIVATION_WINDOW_HOURS", "2")`.
pub fn test_config_with(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", TEST_DATABASE_URL),
        ("BIND_ADDRESS", "127.0.0.1:0"),
        ("TOKEN_ISSUER", TEST_ISSUER),
        ("TOKEN_SECRET", TEST_SIGNING_KEY),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }

    Config::from_vars(&vars).expect("test configuration must be valid")
}

/// A would-be user and the request bodies they send.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub forename: String,
    pub surname: String,
}

/// The primary test user, Bob Smith.
pub fn bob() -> TestUser {
    TestUser {
        username: TEST_USERNAME.to_string(),
        email: TEST_EMAIL.to_string(),
        password: TEST_PASSWORD.to_string(),
        forename: TEST_FORENAME.to_string(),
        surname: TEST_SURNAME.to_string(),
    }
}

/// A second user who clashes with nobody.
pub fn alice() -> TestUser {
    TestUser {
        username: TEST_USERNAME_ALICE.to_string(),
        email: TEST_EMAIL_ALICE.to_string(),
        password: "Alice456!".to_string(),
        forename: "Alice".to_string(),
        surname: "Jones".to_string(),
    }
}

impl TestUser {
    pub fn registration_body(&self) -> Value {
        json!({
            "username": self.username,
            "email": self.email,
            "password": self.password,
            "forename": self.forename,
            "surname": self.surname,
        })
    }

    pub fn activation_body(&self, activation_code: Uuid) -> Value {
        json!({
            "username": self.username,
            "email": self.email,
            "activation_code": activation_code,
        })
    }

    pub fn login_by_username(&self, duration: Option<i64>) -> Value {
        json!({
            "username": self.username,
            "password": self.password,
            "duration": duration,
        })
    }

    pub fn login_by_email(&self, duration: Option<i64>) -> Value {
        json!({
            "email": self.email,
            "password": self.password,
            "duration": duration,
        })
    }
}

/// Builder for identities stored directly in a repository
///
/// # Example
/// ```rust,ignore
/// let identity = TestIdentityBuilder::new()
///     .for_user(&bob())
///     .active()
///     .with_entitlement("list-users")
///     .build();
/// ```
pub struct TestIdentityBuilder {
    identity_id: Uuid,
    user: TestUser,
    federated_id: Option<String>,
    created_on: DateTime<Utc>,
    activated_on: Option<DateTime<Utc>>,
    activation_code: Option<Uuid>,
    activation_code_issued_on: Option<DateTime<Utc>>,
    entitlements: Vec<String>,
}

impl TestIdentityBuilder {
    /// Pending Bob Smith with a fresh activation code issued now
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            identity_id: TEST_IDENTITY_BOB,
            user: bob(),
            federated_id: None,
            created_on: now,
            activated_on: None,
            activation_code: Some(Uuid::new_v4()),
            activation_code_issued_on: Some(now),
            entitlements: Vec::new(),
        }
    }

    pub fn with_id(mut self, identity_id: Uuid) -> Self {
        self.identity_id = identity_id;
        self
    }

    pub fn for_user(mut self, user: &TestUser) -> Self {
        self.user = user.clone();
        self
    }

    /// Mark the identity active as of its creation time
    pub fn active(mut self) -> Self {
        self.activated_on = Some(self.created_on);
        self
    }

    /// Drop the local password, as for an identity created through a
    /// federated sign-in
    pub fn federated(mut self, federated_id: &str) -> Self {
        self.federated_id = Some(federated_id.to_string());
        self
    }

    /// Issue the activation code `age` before now
    pub fn code_issued_ago(mut self, age: Duration) -> Self {
        let issued_on = Utc::now() - age;
        self.created_on = issued_on;
        self.activation_code_issued_on = Some(issued_on);
        self
    }

    pub fn with_activation_code(mut self, code: Uuid) -> Self {
        self.activation_code = Some(code);
        self
    }

    pub fn with_entitlement(mut self, tag: &str) -> Self {
        self.entitlements.push(tag.to_string());
        self
    }

    pub fn build(self) -> Identity {
        let (password_salt, password_hash) = if self.federated_id.is_some() {
            (None, None)
        } else {
            (
                Some(TEST_SALT.to_string()),
                Some(crypto::hash_password(&self.user.password, Some(TEST_SALT))),
            )
        };

        Identity {
            identity_id: self.identity_id,
            username: Some(self.user.username),
            registered_email: self.user.email,
            password_salt,
            password_hash,
            forename: self.user.forename,
            surname: self.user.surname,
            federated_id: self.federated_id,
            created_on: self.created_on,
            activated_on: self.activated_on,
            activation_code: self.activation_code,
            activation_code_issued_on: self.activation_code_issued_on,
            entitlements: self.entitlements,
        }
    }
}

impl Default for TestIdentityBuilder {
    fn default() -> Self {
        Self::new()
    }
}
