//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::auth::{AuthService, AuthTokens, RegisterResponse, RegisterUserInput};
use crate::AppState;

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh request payload
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Register an operator account
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterUserInput>,
) -> AppResult<Json<RegisterResponse>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let response = service.register(input).await?;
    Ok(Json(response))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let tokens = service.login(&input.email, &input.password).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let tokens = service.refresh_token(&input.refresh_token).await?;
    Ok(Json(tokens))
}
