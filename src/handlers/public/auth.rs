// handlers/public/auth.rs - Token acquisition
//
// POST /auth/register, POST /auth/login, POST /auth/reset-password

use axum::extract::State;

use crate::database::models::auth::{AuthPayload, LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::handlers::ValidJson;
use crate::middleware::ApiResult;
use crate::state::AppState;

/// Creates a member account and returns `{user, token}` with 201
pub async fn register(State(state): State<AppState>, ValidJson(request): ValidJson<RegisterRequest>) -> ApiResult<AuthPayload> {
    state.auth.register(request).await
}

pub async fn login(State(state): State<AppState>, ValidJson(request): ValidJson<LoginRequest>) -> ApiResult<AuthPayload> {
    state.auth.login(request).await
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<ResetPasswordRequest>,
) -> ApiResult<()> {
    state.auth.reset_password(request).await
}
