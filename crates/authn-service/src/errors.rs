use crate::validation::Violation;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const NO_MATCH_MESSAGE: &str = "No matching users found.";
pub const NOT_FOUND_MESSAGE: &str = "User not found";

#[derive(Debug, Error)]
pub enum AuthnError {
    /// One or more field-level rule violations. Always carries the full list.
    #[error("Validation failed with {} violation(s)", .0.len())]
    ValidationFailed(Vec<Violation>),

    #[error("{0}")]
    IdentityConflict(String),

    #[error("{0}")]
    NoMatch(String),

    #[error("{0}")]
    NotFound(String),

    #[error("User is already activated.")]
    AlreadyActivated,

    #[error("Activation code expired.")]
    CodeExpired,

    #[error("Invalid password")]
    InvalidCredentials,

    /// A caller supplied an argument that violates a precondition
    /// (e.g. a blank token issuer or a short signing key).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,
}

impl AuthnError {
    pub fn no_match() -> Self {
        AuthnError::NoMatch(NO_MATCH_MESSAGE.to_string())
    }

    pub fn not_found() -> Self {
        AuthnError::NotFound(NOT_FOUND_MESSAGE.to_string())
    }

    /// Stable machine-readable code, also used as a bounded metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            AuthnError::ValidationFailed(_) => "VALIDATION_FAILED",
            AuthnError::IdentityConflict(_) => "IDENTITY_CONFLICT",
            AuthnError::NoMatch(_) => "NO_MATCH",
            AuthnError::NotFound(_) => "NOT_FOUND",
            AuthnError::AlreadyActivated => "ALREADY_ACTIVATED",
            AuthnError::CodeExpired => "CODE_EXPIRED",
            AuthnError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthnError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AuthnError::Crypto(_) => "CRYPTO_ERROR",
            AuthnError::Database(_) => "DATABASE_ERROR",
            AuthnError::Internal => "INTERNAL_ERROR",
        }
    }

    /// True for failures that are not the caller's fault and surface as 500.
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            AuthnError::InvalidArgument(_)
                | AuthnError::Crypto(_)
                | AuthnError::Database(_)
                | AuthnError::Internal
        )
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<Vec<Violation>>,
}

impl IntoResponse for AuthnError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message, violations) = match self {
            AuthnError::ValidationFailed(violations) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "One or more validation errors occurred.".to_string(),
                Some(violations),
            ),
            AuthnError::IdentityConflict(message)
            | AuthnError::NoMatch(message)
            | AuthnError::NotFound(message) => (StatusCode::BAD_REQUEST, message, None),
            e @ (AuthnError::AlreadyActivated
            | AuthnError::CodeExpired
            | AuthnError::InvalidCredentials) => (StatusCode::BAD_REQUEST, e.to_string(), None),
            AuthnError::InvalidArgument(_)
            | AuthnError::Crypto(_)
            | AuthnError::Database(_)
            | AuthnError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                violations,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: AuthnError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_failed_maps_to_422_with_all_violations() {
        let violations = vec![
            Violation::new("username", "'Username' must not be empty.", Some("")),
            Violation::new("password", "'Password' must not be empty.", None),
        ];

        let (status, body) = body_json(AuthnError::ValidationFailed(violations)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
        let listed = body["error"]["violations"].as_array().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["field"], "username");
        assert_eq!(listed[1]["attempted_value"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_business_rule_errors_map_to_400_with_message() {
        let cases = [
            (
                AuthnError::IdentityConflict("This email is taken".to_string()),
                "IDENTITY_CONFLICT",
                "This email is taken",
            ),
            (AuthnError::no_match(), "NO_MATCH", NO_MATCH_MESSAGE),
            (AuthnError::not_found(), "NOT_FOUND", NOT_FOUND_MESSAGE),
            (
                AuthnError::AlreadyActivated,
                "ALREADY_ACTIVATED",
                "User is already activated.",
            ),
            (
                AuthnError::CodeExpired,
                "CODE_EXPIRED",
                "Activation code expired.",
            ),
            (
                AuthnError::InvalidCredentials,
                "INVALID_CREDENTIALS",
                "Invalid password",
            ),
        ];

        for (error, code, message) in cases {
            let (status, body) = body_json(error).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], code);
            assert_eq!(body["error"]["message"], message);
            assert!(body["error"].get("violations").is_none());
        }
    }

    #[tokio::test]
    async fn test_unexpected_errors_map_to_500_without_detail() {
        let (status, body) =
            body_json(AuthnError::Database("connection refused on 10.0.0.7".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
        assert!(!body.to_string().contains("10.0.0.7"));
    }

    #[test]
    fn test_is_unexpected_matches_server_errors() {
        assert!(AuthnError::Database("connection refused".to_string()).is_unexpected());
        assert!(AuthnError::Crypto("rng".to_string()).is_unexpected());
        assert!(AuthnError::InvalidArgument("issuer".to_string()).is_unexpected());
        assert!(AuthnError::Internal.is_unexpected());

        assert!(!AuthnError::ValidationFailed(vec![]).is_unexpected());
        assert!(!AuthnError::no_match().is_unexpected());
        assert!(!AuthnError::not_found().is_unexpected());
        assert!(!AuthnError::AlreadyActivated.is_unexpected());
        assert!(!AuthnError::CodeExpired.is_unexpected());
        assert!(!AuthnError::InvalidCredentials.is_unexpected());
        assert!(!AuthnError::IdentityConflict("This email is taken".to_string()).is_unexpected());
    }
}
