//! Registration, login, token refresh and profile endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::User;
use domain::{Principal, Registration};
use serde::{Deserialize, Serialize};
use store::Store;

use super::DataResponse;
use crate::error::ApiError;
use crate::middleware::{ApiJson, AuthUser};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub status: bool,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub status: bool,
}

/// POST /api/register
#[tracing::instrument(skip(state, registration))]
pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(registration): ApiJson<Registration>,
) -> Result<(StatusCode, Json<DataResponse<User>>), ApiError> {
    let user = state.auth.register(registration).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

/// POST /api/login
#[tracing::instrument(skip(state, req))]
pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    tracing::debug!(request = ?req, "login attempt");
    let tokens = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        status: true,
    }))
}

/// POST /api/refresh
#[tracing::instrument(skip(state, req))]
pub async fn refresh<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let access_token = state.auth.refresh(&req.refresh_token).await?;
    Ok(Json(RefreshResponse {
        access_token,
        status: true,
    }))
}

/// GET /api/profile — the authenticated caller.
pub async fn profile(AuthUser(principal): AuthUser) -> Json<DataResponse<Principal>> {
    Json(DataResponse::new(principal))
}
