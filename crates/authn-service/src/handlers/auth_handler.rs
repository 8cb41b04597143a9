use crate::config::Config;
use crate::errors::AuthnError;
use crate::models::{
    ActivationRequest, IssuedToken, LoginRequest, RegistrationRequest, RegistrationSuccess,
};
use crate::repositories::IdentityRepository;
use crate::services::{activation_service, login_service, registration_service};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn IdentityRepository>,
    pub config: Config,
}

/// Handle legacy registration
///
/// POST /api/v1/legacy/register
pub async fn handle_register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegistrationRequest>,
) -> Result<Json<RegistrationSuccess>, AuthnError> {
    let success =
        registration_service::register(state.repo.as_ref(), &state.config.rules, &payload).await?;

    Ok(Json(success))
}

/// Handle activation of a pending identity
///
/// PUT /api/v1/legacy/activate
pub async fn handle_activate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ActivationRequest>,
) -> Result<StatusCode, AuthnError> {
    activation_service::activate(state.repo.as_ref(), &state.config.rules, &payload).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handle password login
///
/// POST /api/v1/legacy/login
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<IssuedToken>, AuthnError> {
    let issued = login_service::login(
        state.repo.as_ref(),
        &state.config.rules,
        &state.config.token,
        &payload,
    )
    .await?;

    Ok(Json(issued))
}
