//! HTTP routes for the identity service.

use crate::handlers::{self, AppState};
use crate::middleware::http_metrics_middleware;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Request timeout applied at the transport boundary.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application routes.
///
/// - `/health` - Liveness probe
/// - `/ready` - Readiness probe (identity store reachable)
/// - `/metrics` - Prometheus metrics
/// - `/api/v1/legacy/register` - Register a pending identity
/// - `/api/v1/legacy/activate` - Activate with the emailed code
/// - `/api/v1/legacy/login` - Password login, returns a signed token
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/v1/legacy/register", post(handlers::handle_register))
        .route("/api/v1/legacy/activate", put(handlers::handle_activate))
        .route("/api/v1/legacy/login", post(handlers::handle_login))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. http_metrics_middleware (outermost, sees every response)
    api_routes
        .merge(metrics_routes)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}
