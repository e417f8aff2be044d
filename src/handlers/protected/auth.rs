// handlers/protected/auth.rs - Session endpoints for an authenticated caller

use axum::{extract::State, Extension};

use crate::database::models::auth::ChangePasswordRequest;
use crate::database::models::user::User;
use crate::handlers::ValidJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /auth/me
pub async fn me(State(state): State<AppState>, Extension(caller): Extension<AuthUser>) -> ApiResult<User> {
    state.auth.current_user(caller.id).await
}

/// POST /auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(request): ValidJson<ChangePasswordRequest>,
) -> ApiResult<()> {
    state.auth.change_password(caller.id, request).await
}

/// POST /auth/logout. Tokens are stateless; the client discards its copy.
pub async fn logout(Extension(caller): Extension<AuthUser>) -> ApiResponse<()> {
    tracing::debug!("User {} logged out", caller.id);
    ApiResponse::message_only("Logout successful")
}
