use std::sync::Arc;

use tracing::{info, warn};

use super::{db_failure, insufficient_permissions, normalize_email};
use crate::auth::hash_password;
use crate::database::models::user::{
    CreateUserRequest, NewUser, UpdateUserRequest, User, UserProfile, UserQuery,
};
use crate::database::models::UserSummary;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::repository::UserRepository;

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Administrators only
    pub async fn create(&self, caller: &AuthUser, request: CreateUserRequest) -> ApiResult<User> {
        if !caller.is_admin() {
            warn!("User {} attempted to create a user without admin role", caller.id);
            return Err(insufficient_permissions());
        }

        let email = normalize_email(&request.email);
        let failed = db_failure("Failed to create user");
        if self.users.find_by_email(&email).await.map_err(&failed)?.is_some() {
            return Err(ApiError::conflict("Email already exists"));
        }

        let password_hash = hash_password(&request.password).await.map_err(|e| {
            tracing::error!("Failed to create user: {}", e);
            ApiError::internal_server_error("Failed to create user")
        })?;

        let user = self
            .users
            .create(NewUser {
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                email,
                password_hash,
                role: request.role,
                avatar: request.avatar,
            })
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    ApiError::conflict("Email already exists")
                } else {
                    failed(e)
                }
            })?;

        info!("User {} created user {}", caller.id, user.id);
        Ok(ApiResponse::created("User created successfully", user))
    }

    pub async fn list(&self, query: &UserQuery) -> ApiResult<Vec<User>> {
        let users = self.users.list(query).await.map_err(db_failure("Failed to retrieve users"))?;
        Ok(ApiResponse::success("Users retrieved successfully", users))
    }

    pub async fn list_simple(&self) -> ApiResult<Vec<UserSummary>> {
        let users = self
            .users
            .list_active_summaries()
            .await
            .map_err(db_failure("Failed to retrieve users"))?;
        Ok(ApiResponse::success("Users retrieved successfully", users))
    }

    pub async fn get(&self, id: i32) -> ApiResult<User> {
        let user = self
            .users
            .find_by_id(id)
            .await
            .map_err(db_failure("Failed to retrieve user"))?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(ApiResponse::success("User retrieved successfully", user))
    }

    pub async fn profile(&self, id: i32) -> ApiResult<UserProfile> {
        let profile = self
            .users
            .profile(id)
            .await
            .map_err(db_failure("Failed to retrieve user profile"))?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(ApiResponse::success("User profile retrieved successfully", profile))
    }

    /// Users edit themselves; `role` and `isActive` need an administrator
    pub async fn update(&self, caller: &AuthUser, id: i32, mut request: UpdateUserRequest) -> ApiResult<User> {
        if caller.id != id && !caller.is_admin() {
            warn!("User {} attempted to update user {}", caller.id, id);
            return Err(insufficient_permissions());
        }
        if request.touches_privileged_fields() && !caller.is_admin() {
            warn!("User {} attempted to change role or activation of user {}", caller.id, id);
            return Err(insufficient_permissions());
        }

        let failed = db_failure("Failed to update user");
        if let Some(email) = request.email.as_deref().map(normalize_email) {
            let taken = self.users.find_by_email(&email).await.map_err(&failed)?;
            if taken.is_some_and(|existing| existing.id != id) {
                return Err(ApiError::conflict("Email already exists"));
            }
            request.email = Some(email);
        }

        let user = self
            .users
            .update(id, &request)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    ApiError::conflict("Email already exists")
                } else {
                    failed(e)
                }
            })?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        Ok(ApiResponse::success("User updated successfully", user))
    }

    /// Administrators only. Owners of projects and creators of tasks must hand them over first.
    pub async fn delete(&self, caller: &AuthUser, id: i32) -> ApiResult<()> {
        if !caller.is_admin() {
            warn!("User {} attempted to delete user {}", caller.id, id);
            return Err(insufficient_permissions());
        }

        let failed = db_failure("Failed to delete user");
        if self.users.find_by_id(id).await.map_err(&failed)?.is_none() {
            return Err(ApiError::not_found("User not found"));
        }
        if self.users.owns_projects(id).await.map_err(&failed)? {
            return Err(ApiError::conflict("User owns projects"));
        }
        if self.users.created_tasks(id).await.map_err(&failed)? {
            return Err(ApiError::conflict("User has created tasks"));
        }

        self.users.delete(id).await.map_err(&failed)?;
        info!("User {} deleted user {}", caller.id, id);
        Ok(ApiResponse::message_only("User deleted successfully"))
    }
}
