//! Registration and login.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use boxoffice_core::{
    user::{login as verify_login, register as create_account},
    AuditEvent, RegisterRequest, User, UserProfile,
};

use super::error::ApiError;
use crate::state::AppState;

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// Response for register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
    pub message: String,
}

fn auth_response(state: &AppState, user: &User, message: &str) -> Result<AuthResponse, ApiError> {
    let token = state.tokens().issue_token(&user.id, user.role)?;
    Ok(AuthResponse {
        token,
        user: user.profile(),
        message: message.to_string(),
    })
}

/// Create an account and sign the caller in
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(request) = body?;
    let user = create_account(state.user_store(), request)?;

    state.audit().try_emit(AuditEvent::UserRegistered {
        user_id: user.id.clone(),
        email: user.email.clone(),
        role: user.role.to_string(),
    });

    let response = auth_response(&state, &user, "User registered successfully")?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchange email and password for a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(body) = body?;
    let user = verify_login(state.user_store(), &body.email, &body.password)?;

    Ok(Json(auth_response(&state, &user, "Login successful")?))
}
