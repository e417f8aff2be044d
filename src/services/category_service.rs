use std::sync::Arc;

use tracing::warn;

use super::db_failure;
use crate::database::models::category::{
    Category, CategoryQuery, CategoryWithCounts, CreateCategoryRequest, UpdateCategoryRequest,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::repository::CategoryRepository;

pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    /// `isGlobal` categories have no owner and need an administrator
    pub async fn create(&self, caller: &AuthUser, request: CreateCategoryRequest) -> ApiResult<Category> {
        if request.is_global && !caller.is_admin() {
            warn!("User {} attempted to create a global category", caller.id);
            return Err(ApiError::forbidden("Only admins can create global categories"));
        }

        let owner_id = if request.is_global { None } else { Some(caller.id) };
        let category = self
            .categories
            .create(owner_id, &request)
            .await
            .map_err(db_failure("Failed to create category"))?;
        Ok(ApiResponse::created("Category created successfully", category))
    }

    /// Caller's categories plus globals; administrators may list another user's
    pub async fn list(&self, caller: &AuthUser, query: &CategoryQuery) -> ApiResult<Vec<CategoryWithCounts>> {
        let owner_id = match query.user_id {
            Some(user_id) if caller.is_admin() => user_id,
            _ => caller.id,
        };
        let categories = self
            .categories
            .list(owner_id, query.include_global(), query.search.as_deref())
            .await
            .map_err(db_failure("Failed to retrieve categories"))?;
        Ok(ApiResponse::success("Categories retrieved successfully", categories))
    }

    pub async fn list_global(&self) -> ApiResult<Vec<CategoryWithCounts>> {
        let categories = self
            .categories
            .list_global()
            .await
            .map_err(db_failure("Failed to retrieve global categories"))?;
        Ok(ApiResponse::success("Global categories retrieved successfully", categories))
    }

    pub async fn my_categories(&self, caller: &AuthUser) -> ApiResult<Vec<CategoryWithCounts>> {
        let categories = self
            .categories
            .list(caller.id, false, None)
            .await
            .map_err(db_failure("Failed to retrieve user categories"))?;
        Ok(ApiResponse::success("User categories retrieved successfully", categories))
    }

    pub async fn get(&self, id: i32) -> ApiResult<CategoryWithCounts> {
        let category = self
            .categories
            .with_counts(id)
            .await
            .map_err(db_failure("Failed to retrieve category"))?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;
        Ok(ApiResponse::success("Category retrieved successfully", category))
    }

    pub async fn update(&self, caller: &AuthUser, id: i32, request: UpdateCategoryRequest) -> ApiResult<Category> {
        let failed = db_failure("Failed to update category");
        let category = self
            .categories
            .find_by_id(id)
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;

        if category.is_global() && !caller.is_admin() {
            return Err(ApiError::forbidden("Only admins can update global categories"));
        }
        if !category.is_global() && category.user_id != Some(caller.id) {
            return Err(ApiError::forbidden("You can only update your own categories"));
        }

        let category = self
            .categories
            .update(id, &request)
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;
        Ok(ApiResponse::success("Category updated successfully", category))
    }

    /// Tasks in the category are kept and lose their category
    pub async fn delete(&self, caller: &AuthUser, id: i32) -> ApiResult<()> {
        let failed = db_failure("Failed to delete category");
        let category = self
            .categories
            .find_by_id(id)
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;

        if category.is_global() && !caller.is_admin() {
            return Err(ApiError::forbidden("Only admins can delete global categories"));
        }
        if !category.is_global() && category.user_id != Some(caller.id) {
            return Err(ApiError::forbidden("You can only delete your own categories"));
        }

        self.categories.delete(id).await.map_err(&failed)?;
        Ok(ApiResponse::message_only("Category deleted successfully"))
    }
}
