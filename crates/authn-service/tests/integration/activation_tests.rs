//! E2E tests for the activation endpoint.

use authn_service::repositories::IdentityRepository;
use authn_test_utils::*;
use chrono::Duration;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

async fn error_of(response: reqwest::Response) -> Result<(StatusCode, Value), anyhow::Error> {
    let status = response.status();
    let body: Value = response.json().await?;
    Ok((status, body["error"].clone()))
}

/// Any mismatch in the username/email/code triple is NoMatch, and the
/// identity stays pending.
#[tokio::test]
async fn test_activate_mismatched_triple_is_no_match() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let user = bob();
    let registered = server.register(&user).await?;

    let bodies = [
        json!({"username": TEST_USERNAME, "email": TEST_EMAIL, "activation_code": Uuid::new_v4()}),
        json!({"username": TEST_USERNAME, "email": TEST_EMAIL_ALICE, "activation_code": registered.activation_code}),
        json!({"username": TEST_USERNAME_ALICE, "email": TEST_EMAIL, "activation_code": registered.activation_code}),
    ];

    for body in &bodies {
        // Act
        let (status, error) = error_of(server.put_json(ACTIVATE_PATH, body).await?).await?;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], "NO_MATCH");
        assert_eq!(error["message"], "No matching users found.");
    }

    let stored = server.repo().find_by_username(TEST_USERNAME).await?;
    assert!(stored.is_some_and(|i| !i.is_active()));
    Ok(())
}

/// A missing or all-zero activation code fails validation.
#[tokio::test]
async fn test_activate_nil_code_is_validation_failure() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.register(&bob()).await?;

    for body in [
        json!({"username": TEST_USERNAME, "email": TEST_EMAIL}),
        json!({"username": TEST_USERNAME, "email": TEST_EMAIL, "activation_code": Uuid::nil()}),
    ] {
        let (status, error) = error_of(server.put_json(ACTIVATE_PATH, &body).await?).await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["violations"][0]["field"], "activation_code");
    }
    Ok(())
}

/// Replaying a successful activation reports AlreadyActivated.
#[tokio::test]
async fn test_activate_replay_is_already_activated() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let user = bob();
    let registered = server.register(&user).await?;
    let body = user.activation_body(registered.activation_code);

    let first = server.put_json(ACTIVATE_PATH, &body).await?;
    assert_eq!(first.status(), StatusCode::NO_CONTENT);
    let activated_on = server
        .repo()
        .find_by_username(TEST_USERNAME)
        .await?
        .and_then(|i| i.activated_on);

    // Act
    let (status, error) = error_of(server.put_json(ACTIVATE_PATH, &body).await?).await?;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "ALREADY_ACTIVATED");
    assert_eq!(error["message"], "User is already activated.");

    let unchanged = server
        .repo()
        .find_by_username(TEST_USERNAME)
        .await?
        .and_then(|i| i.activated_on);
    assert_eq!(unchanged, activated_on);
    Ok(())
}

/// A code older than the activation window has expired.
#[tokio::test]
async fn test_activate_stale_code_is_expired() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let code = Uuid::new_v4();
    let identity = TestIdentityBuilder::new()
        .with_activation_code(code)
        .code_issued_ago(Duration::hours(25))
        .build();
    server.repo().add_identity(&identity).await?;

    // Act
    let (status, error) =
        error_of(server.put_json(ACTIVATE_PATH, &bob().activation_body(code)).await?).await?;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "CODE_EXPIRED");
    assert_eq!(error["message"], "Activation code expired.");
    assert_eq!(server.repo().write_count(), 1);
    Ok(())
}

/// A code just inside the window still activates.
#[tokio::test]
async fn test_activate_code_inside_window_succeeds() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let code = Uuid::new_v4();
    let identity = TestIdentityBuilder::new()
        .with_activation_code(code)
        .code_issued_ago(Duration::hours(23))
        .build();
    server.repo().add_identity(&identity).await?;

    let response = server
        .put_json(ACTIVATE_PATH, &bob().activation_body(code))
        .await?;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    Ok(())
}

/// Activation is PUT only.
#[tokio::test]
async fn test_activate_post_is_method_not_allowed() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server
        .post_json(ACTIVATE_PATH, &bob().activation_body(Uuid::new_v4()))
        .await?;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}
