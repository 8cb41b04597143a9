//! E2E tests for the registration endpoint.

use authn_service::repositories::IdentityRepository;
use authn_test_utils::*;
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn violation_fields(body: &Value) -> Vec<String> {
    body["error"]["violations"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|v| v["field"].as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Registration returns a code that expires one activation window later.
#[tokio::test]
async fn test_register_returns_code_and_expiry() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let before = Utc::now();

    // Act
    let registered = server.register(&bob()).await?;

    // Assert
    let window = server.config().rules.activation_window;
    assert!(registered.expires_on >= before + window);
    assert!(registered.expires_on <= Utc::now() + window);

    let stored = server
        .repo()
        .find_by_username(TEST_USERNAME)
        .await?
        .ok_or_else(|| anyhow::anyhow!("identity should be stored"))?;
    assert!(!stored.is_active());
    assert_eq!(stored.activation_code, Some(registered.activation_code));
    Ok(())
}

/// The activation window is taken from configuration.
#[tokio::test]
async fn test_register_honours_configured_window() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn_with(
        test_config_with(&[("ACTIVATION_WINDOW_HOURS", "2")]),
        Default::default(),
    )
    .await?;

    let response = server
        .post_json(REGISTER_PATH, &bob().registration_body())
        .await?;
    let body: Value = response.json().await?;
    let expires_on: DateTime<Utc> = serde_json::from_value(body["expires_on"].clone())?;

    assert!(expires_on <= Utc::now() + Duration::hours(2));
    assert!(expires_on > Utc::now() + Duration::minutes(119));
    Ok(())
}

/// Every violation is reported in one 422 response and nothing is stored.
#[tokio::test]
async fn test_register_invalid_body_returns_all_violations() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;

    // Act
    let response = server
        .post_json(
            REGISTER_PATH,
            &json!({
                "username": "bob",
                "email": "not-an-email",
                "password": "weak",
                "forename": "B",
                "surname": "Smith"
            }),
        )
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");

    let fields = violation_fields(&body);
    for expected in ["username", "email", "password", "forename"] {
        assert!(
            fields.iter().any(|f| f == expected),
            "Expected a violation for '{}', got {:?}",
            expected,
            fields
        );
    }
    assert!(!fields.iter().any(|f| f == "surname"));

    // Password values are never echoed back
    let raw = body.to_string();
    assert!(!raw.contains("weak"));

    assert!(server.repo().is_empty().await);
    Ok(())
}

/// Missing fields are reported as violations, not as a body parse error.
#[tokio::test]
async fn test_register_empty_body_is_validation_failure() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server.post_json(REGISTER_PATH, &json!({})).await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await?;
    assert!(violation_fields(&body).len() >= 5);
    Ok(())
}

/// A second registration with a pending user's email or username is refused.
#[tokio::test]
async fn test_register_duplicate_pending_is_conflict() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server.register(&bob()).await?;

    let mut same_email = alice();
    same_email.email = TEST_EMAIL.to_uppercase();
    let mut same_username = alice();
    same_username.username = TEST_USERNAME.to_string();

    let cases = [
        (same_email, "This email is awaiting activation"),
        (same_username, "This username is awaiting activation"),
    ];

    for (user, message) in cases {
        // Act
        let response = server
            .post_json(REGISTER_PATH, &user.registration_body())
            .await?;

        // Assert
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await?;
        assert_eq!(body["error"]["code"], "IDENTITY_CONFLICT");
        assert_eq!(body["error"]["message"], message);
    }

    assert_eq!(server.repo().len().await, 1);
    Ok(())
}

/// Once active, the conflict message says the email is taken.
#[tokio::test]
async fn test_register_duplicate_active_is_taken() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.register_activate_and_login(&bob()).await?;

    let mut same_email = alice();
    same_email.email = TEST_EMAIL.to_string();
    let response = server
        .post_json(REGISTER_PATH, &same_email.registration_body())
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["message"], "This email is taken");
    Ok(())
}

/// Concurrent registrations for one username leave exactly one identity.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_register_concurrent_duplicates_store_one() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let url = format!("{}{}", server.url(), REGISTER_PATH);
    let client = reqwest::Client::new();

    // Act
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let mut user = bob();
        user.email = format!("bob{}@test.co", i);
        let request = client.post(&url).json(&user.registration_body());
        tasks.spawn(async move { request.send().await });
    }

    // Assert
    let mut ok = 0;
    while let Some(joined) = tasks.join_next().await {
        let response = joined??;
        if response.status() == StatusCode::OK {
            ok += 1;
        } else {
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
    assert_eq!(ok, 1, "Exactly one registration should win");
    assert_eq!(server.repo().len().await, 1);
    Ok(())
}
