//! HTTP request handlers.

pub mod auth_handler;
pub mod health;
pub mod metrics;

pub use auth_handler::{handle_activate, handle_login, handle_register, AppState};
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
