//! Fault injection tests for identity store unavailability
//!
//! These tests validate that the service handles store failures gracefully:
//! - Readiness probe returns 503 while the store is failing
//! - Health probe still returns 200 (liveness unaffected)
//! - Workflow errors are generic 500s that don't leak store details

use authn_test_utils::*;
use reqwest::StatusCode;
use serde_json::Value;

/// /ready flips to 503 and back as the store fails and recovers.
#[tokio::test]
async fn test_readiness_follows_repository_health() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    assert_eq!(server.get("/ready").await?.status(), StatusCode::OK);

    // Act
    server.repo().set_failing(true);

    // Assert
    let response = server.get("/ready").await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await?;
    assert_eq!(body["status"].as_str(), Some("not_ready"));
    assert_eq!(
        body["error"].as_str(),
        Some("Service dependencies unavailable")
    );

    assert_eq!(
        server.get("/health").await?.status(),
        StatusCode::OK,
        "Liveness should not depend on the store"
    );

    server.repo().set_failing(false);
    assert_eq!(server.get("/ready").await?.status(), StatusCode::OK);
    Ok(())
}

/// Workflow endpoints answer 500 with a generic message when the store fails.
#[tokio::test]
async fn test_workflow_store_failure_is_generic_500() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server.repo().set_failing(true);
    let user = bob();

    // Act
    let responses = [
        server
            .post_json(REGISTER_PATH, &user.registration_body())
            .await?,
        server
            .put_json(ACTIVATE_PATH, &user.activation_body(uuid::Uuid::new_v4()))
            .await?,
        server
            .post_json(LOGIN_PATH, &user.login_by_username(None))
            .await?,
    ];

    // Assert
    for response in responses {
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json().await?;
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(!body.to_string().contains("Injected"));
    }
    Ok(())
}

/// Validation still runs first, so a bad request is 422 even while the
/// store is down.
#[tokio::test]
async fn test_invalid_request_is_422_while_store_down() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.repo().set_failing(true);

    let response = server
        .post_json(REGISTER_PATH, &serde_json::json!({"username": "bob"}))
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}
