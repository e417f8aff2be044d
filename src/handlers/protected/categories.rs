// handlers/protected/categories.rs - /categories

use axum::{extract::State, Extension};

use crate::database::models::category::{
    Category, CategoryQuery, CategoryWithCounts, CreateCategoryRequest, UpdateCategoryRequest,
};
use crate::handlers::{ApiPath, ApiQuery, ValidJson};
use crate::middleware::{ApiResult, AuthUser};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(request): ValidJson<CreateCategoryRequest>,
) -> ApiResult<Category> {
    state.categories.create(&caller, request).await
}

pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> ApiResult<Vec<CategoryWithCounts>> {
    state.categories.list(&caller, &query).await
}

pub async fn list_global(State(state): State<AppState>) -> ApiResult<Vec<CategoryWithCounts>> {
    state.categories.list_global().await
}

pub async fn my_categories(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<CategoryWithCounts>> {
    state.categories.my_categories(&caller).await
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i32>) -> ApiResult<CategoryWithCounts> {
    state.categories.get(id).await
}

pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ValidJson(request): ValidJson<UpdateCategoryRequest>,
) -> ApiResult<Category> {
    state.categories.update(&caller, id, request).await
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<()> {
    state.categories.delete(&caller, id).await
}
