//! Integration tests for health probes and the metrics endpoint

use authn_test_utils::{bob, TestAuthServer, REGISTER_PATH};
use reqwest::StatusCode;

// ============================================================================
// Liveness Probe Tests
// ============================================================================

/// /health returns 200 OK with a plain body.
#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;

    // Act
    let response = server.get("/health").await?;

    // Assert
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Health check should return 200 OK"
    );
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

// ============================================================================
// Readiness Probe Tests
// ============================================================================

/// /ready returns 200 when the identity store answers.
#[tokio::test]
async fn test_ready_endpoint_returns_ok_when_healthy() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;

    // Act
    let response = server.get("/ready").await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"].as_str(), Some("ready"));
    assert!(body.get("error").is_none());

    Ok(())
}

// ============================================================================
// Metrics Endpoint Tests
// ============================================================================

/// /metrics serves Prometheus text after traffic has flowed.
#[tokio::test]
async fn test_metrics_endpoint_serves_text() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server
        .post_json(REGISTER_PATH, &bob().registration_body())
        .await?;

    // Act
    let response = server.get("/metrics").await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    // The global recorder may belong to another test server in this
    // process, so only the response shape is checked here.
    let _body = response.text().await?;

    Ok(())
}

/// Unknown paths are 404 and never reach a handler.
#[tokio::test]
async fn test_unknown_path_returns_404() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server.get("/api/v1/legacy/unknown").await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
