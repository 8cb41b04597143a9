//! E2E tests for the full Register → Activate → Login workflow.
//!
//! ## Test Naming
//!
//! Tests follow the convention: `test_<feature>_<scenario>_<expected_result>`

use authn_service::repositories::IdentityRepository;
use authn_test_utils::*;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Bob registers, activates with the emailed code, logs in with the right
/// password and is refused with the wrong one.
#[tokio::test]
async fn test_workflow_bobsmith_end_to_end() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let user = bob();

    // Act - register
    let response = server
        .post_json(REGISTER_PATH, &user.registration_body())
        .await?;
    assert_eq!(response.status(), StatusCode::OK, "Registration should succeed");
    let body: Value = response.json().await?;
    let code: uuid::Uuid = serde_json::from_value(body["activation_code"].clone())?;
    assert!(!code.is_nil());

    // Act - activate
    let response = server
        .put_json(ACTIVATE_PATH, &user.activation_body(code))
        .await?;
    assert_eq!(
        response.status(),
        StatusCode::NO_CONTENT,
        "Activation should succeed"
    );

    // Act - login
    let before = Utc::now();
    let response = server
        .post_json(
            LOGIN_PATH,
            &json!({"username": TEST_USERNAME, "password": TEST_PASSWORD}),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK, "Login should succeed");
    let body: Value = response.json().await?;

    // Assert
    let token = body["token"].as_str().unwrap_or_default().to_string();
    assert!(!token.is_empty(), "Token must not be empty");
    token
        .assert_valid_jwt()
        .assert_verifies_with(TEST_SIGNING_KEY, TEST_ISSUER)
        .assert_for_subject(TEST_USERNAME)
        .assert_for_email(TEST_EMAIL)
        .assert_expires_in(3600);

    let expires_on: DateTime<Utc> = serde_json::from_value(body["token_expires_on"].clone())?;
    assert!(expires_on > before, "Expiry must be in the future");
    assert_eq!(body["user"]["username"].as_str(), Some(TEST_USERNAME));
    assert!(body["user"]["activated_on"].is_string());

    // Act - wrong password
    let response = server
        .post_json(
            LOGIN_PATH,
            &json!({"username": TEST_USERNAME, "password": "wrong"}),
        )
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

    Ok(())
}

/// The issued token never carries credential material.
#[tokio::test]
async fn test_workflow_login_response_omits_credentials() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let issued = server.register_activate_and_login(&bob()).await?;
    let body = serde_json::to_string(&issued)?;

    assert!(!body.contains("password"));
    assert!(!body.contains("activation_code"));
    assert!(!body.contains(TEST_PASSWORD));
    Ok(())
}

/// Two users go through the workflow independently on one server.
#[tokio::test]
async fn test_workflow_two_users_get_distinct_tokens() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let bob_token = server.register_activate_and_login(&bob()).await?;
    let alice_token = server.register_activate_and_login(&alice()).await?;

    bob_token.token.assert_for_subject(TEST_USERNAME);
    alice_token.token.assert_for_subject(TEST_USERNAME_ALICE);
    assert_eq!(server.repo().len().await, 2);
    Ok(())
}

/// Seeded entitlements show up in the privileges claim.
#[tokio::test]
async fn test_workflow_entitlements_become_privileges() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let identity = TestIdentityBuilder::new()
        .active()
        .with_entitlement(ENTITLEMENT_LIST_USERS)
        .with_entitlement(ENTITLEMENT_DELETE_USER)
        .build();
    server.repo().add_identity(&identity).await?;

    // Act
    let response = server
        .post_json(LOGIN_PATH, &bob().login_by_email(None))
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    let token = body["token"].as_str().unwrap_or_default().to_string();
    token
        .assert_has_privilege(ENTITLEMENT_LIST_USERS)
        .assert_has_privilege(ENTITLEMENT_DELETE_USER);
    Ok(())
}
