//! Metrics definitions for the identity service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `authn_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `status`: 2 values (success, error)
//! - `outcome`: bounded by activation results (activated, no_match, ...)
//! - `operation`: 3 values (register, activate, login)
//! - `error_category`: 5 values (see `ErrorCategory`)
//! - `path`: known routes, everything else collapses to `/other`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used to serve
/// `/metrics`.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("authn_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Full("authn_login_duration_seconds".to_string()),
            &[0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000],
        )
        .map_err(|e| format!("Failed to set login duration buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Lifecycle Metrics
// ============================================================================

/// Metric: `authn_registrations_total`
/// Labels: `status`
pub fn record_registration(status: &str) {
    counter!("authn_registrations_total", "status" => status.to_string()).increment(1);
}

/// Metric: `authn_activations_total`
/// Labels: `outcome`
pub fn record_activation(outcome: &str) {
    counter!("authn_activations_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record login outcome and duration
///
/// Metric: `authn_logins_total`, `authn_login_duration_seconds`
/// Labels: `status`
pub fn record_login(status: &str, duration: Duration) {
    histogram!("authn_login_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("authn_logins_total", "status" => status.to_string()).increment(1);
}

/// Metric: `authn_token_issuance_total`
/// Labels: `status`
pub fn record_token_issuance(status: &str) {
    counter!("authn_token_issuance_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// Error Metrics
// ============================================================================

/// Record error by category
///
/// Metric: `authn_errors_total`
/// Labels: `operation`, `error_category`
pub fn record_error(operation: &str, error_category: &str) {
    counter!("authn_errors_total",
        "operation" => operation.to_string(),
        "error_category" => error_category.to_string()
    )
    .increment(1);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `authn_http_requests_total`, `authn_http_request_duration_seconds`
/// Labels: `method`, `path`, `status_code`
///
/// Captures framework-level rejections (415, 400 on bad JSON, 404, 405)
/// as well as handler responses.
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let normalized_path = normalize_path(path);

    histogram!("authn_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => normalized_path.to_string(),
        "status_code" => status_code.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("authn_http_requests_total",
        "method" => method.to_string(),
        "path" => normalized_path.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Map a request path onto a bounded label set.
fn normalize_path(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        "/api/v1/legacy/register" => "/api/v1/legacy/register",
        "/api/v1/legacy/activate" => "/api/v1/legacy/activate",
        "/api/v1/legacy/login" => "/api/v1/legacy/login",
        _ => "/other",
    }
}
