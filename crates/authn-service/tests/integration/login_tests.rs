//! E2E tests for the login endpoint.

use authn_service::repositories::IdentityRepository;
use authn_test_utils::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn login(server: &TestAuthServer, body: &Value) -> Result<(StatusCode, Value), anyhow::Error> {
    let response = server.post_json(LOGIN_PATH, body).await?;
    let status = response.status();
    Ok((status, response.json().await?))
}

async fn seed_active_bob(server: &TestAuthServer) -> Result<(), anyhow::Error> {
    let identity = TestIdentityBuilder::new().active().build();
    server.repo().add_identity(&identity).await?;
    Ok(())
}

/// Login by email is case-insensitive on the address.
#[tokio::test]
async fn test_login_by_email_succeeds() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    seed_active_bob(&server).await?;

    // Act
    let (status, body) = login(
        &server,
        &json!({"email": "Bob@Test.co", "password": TEST_PASSWORD}),
    )
    .await?;

    // Assert
    assert_eq!(status, StatusCode::OK);
    body["token"]
        .as_str()
        .unwrap_or_default()
        .to_string()
        .assert_for_email(TEST_EMAIL)
        .assert_for_subject(TEST_USERNAME);
    Ok(())
}

/// A requested duration inside the bounds sets the token lifetime.
#[tokio::test]
async fn test_login_requested_duration_sets_lifetime() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    seed_active_bob(&server).await?;

    let (status, body) = login(&server, &bob().login_by_username(Some(300))).await?;

    assert_eq!(status, StatusCode::OK);
    body["token"]
        .as_str()
        .unwrap_or_default()
        .to_string()
        .assert_expires_in(300);
    Ok(())
}

/// Durations outside 5..=max are validation failures.
#[tokio::test]
async fn test_login_duration_out_of_range_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    seed_active_bob(&server).await?;

    for duration in [4, 3601] {
        let (status, body) = login(&server, &bob().login_by_username(Some(duration))).await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["violations"][0]["field"], "duration");
    }
    Ok(())
}

/// Supplying both username and email, or neither, fails validation.
#[tokio::test]
async fn test_login_requires_exactly_one_identifier() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let (both, _) = login(
        &server,
        &json!({"username": TEST_USERNAME, "email": TEST_EMAIL, "password": TEST_PASSWORD}),
    )
    .await?;
    let (neither, _) = login(&server, &json!({"password": TEST_PASSWORD})).await?;

    assert_eq!(both, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(neither, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

/// An unknown user is NotFound, distinct from a wrong password.
#[tokio::test]
async fn test_login_unknown_user_is_not_found() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    seed_active_bob(&server).await?;

    let (status, body) = login(&server, &alice().login_by_username(None)).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "User not found");
    Ok(())
}

/// A federated identity has no local password to log in with.
#[tokio::test]
async fn test_login_federated_identity_is_invalid_credentials() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let identity = TestIdentityBuilder::new()
        .with_id(TEST_IDENTITY_FEDERATED)
        .federated(TEST_FEDERATED_ID)
        .active()
        .build();
    server.repo().add_identity(&identity).await?;

    let (status, body) = login(&server, &bob().login_by_username(None)).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    Ok(())
}

/// Failed logins never write to the identity store.
#[tokio::test]
async fn test_login_failure_does_not_mutate() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    seed_active_bob(&server).await?;
    let before = server.repo().snapshot().await;

    let mut wrong = bob();
    wrong.password = "Wrong123!".to_string();
    let (status, _) = login(&server, &wrong.login_by_username(None)).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(server.repo().snapshot().await, before);
    assert_eq!(server.repo().write_count(), 1);
    Ok(())
}
