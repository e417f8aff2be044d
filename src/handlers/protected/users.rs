// handlers/protected/users.rs - /users

use axum::{extract::State, Extension};

use crate::database::models::user::{CreateUserRequest, UpdateUserRequest, User, UserProfile, UserQuery};
use crate::database::models::UserSummary;
use crate::handlers::{ApiPath, ApiQuery, ValidJson};
use crate::middleware::{ApiResult, AuthUser};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(request): ValidJson<CreateUserRequest>,
) -> ApiResult<User> {
    state.users.create(&caller, request).await
}

pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<UserQuery>) -> ApiResult<Vec<User>> {
    state.users.list(&query).await
}

/// Active users for pickers
pub async fn list_simple(State(state): State<AppState>) -> ApiResult<Vec<UserSummary>> {
    state.users.list_simple().await
}

/// Caller's own profile with stats
pub async fn me(State(state): State<AppState>, Extension(caller): Extension<AuthUser>) -> ApiResult<UserProfile> {
    state.users.profile(caller.id).await
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i32>) -> ApiResult<User> {
    state.users.get(id).await
}

pub async fn profile(State(state): State<AppState>, ApiPath(id): ApiPath<i32>) -> ApiResult<UserProfile> {
    state.users.profile(id).await
}

pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ValidJson(request): ValidJson<UpdateUserRequest>,
) -> ApiResult<User> {
    state.users.update(&caller, id, request).await
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<()> {
    state.users.delete(&caller, id).await
}
