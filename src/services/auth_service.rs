use std::sync::Arc;

use tracing::{debug, error, info};

use super::normalize_email;
use crate::auth::{generate_jwt, hash_password, verify_password, AuthError, Claims};
use crate::database::models::auth::{
    AuthPayload, ChangePasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
};
use crate::database::models::user::{NewUser, User, UserRole};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::repository::UserRepository;

pub const RESET_PASSWORD_MESSAGE: &str = "If the email exists, a password reset link has been sent";

/// Translate a credential-flow failure, hiding infrastructure errors behind `action`
fn auth_failure(action: &'static str) -> impl Fn(AuthError) -> ApiError {
    move |err| match err {
        AuthError::Database(ref db) if db.is_unique_violation() => AuthError::EmailTaken.into(),
        AuthError::Database(_) | AuthError::Hashing(_) | AuthError::Token(_) => {
            error!("{}: {}", action, err);
            ApiError::internal_server_error(action)
        }
        other => other.into(),
    }
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn register(&self, request: RegisterRequest) -> ApiResult<AuthPayload> {
        let payload = self.register_user(request).await.map_err(auth_failure("Failed to register user"))?;
        info!("Registered user {} ({})", payload.user.id, payload.user.email);
        Ok(ApiResponse::created("User registered successfully", payload))
    }

    pub async fn login(&self, request: LoginRequest) -> ApiResult<AuthPayload> {
        let payload = self.authenticate(request).await.map_err(auth_failure("Failed to login"))?;
        info!("User {} logged in", payload.user.id);
        Ok(ApiResponse::success("Login successful", payload))
    }

    pub async fn current_user(&self, user_id: i32) -> ApiResult<User> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(super::db_failure("Failed to retrieve user"))?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(ApiResponse::success("User retrieved successfully", user))
    }

    pub async fn change_password(&self, user_id: i32, request: ChangePasswordRequest) -> ApiResult<()> {
        self.replace_password(user_id, request)
            .await
            .map_err(auth_failure("Failed to change password"))?;
        info!("User {} changed password", user_id);
        Ok(ApiResponse::message_only("Password changed successfully"))
    }

    /// Never reveals whether the address is registered and never sends anything
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> ApiResult<()> {
        let email = normalize_email(&request.email);
        let known = self
            .users
            .find_by_email(&email)
            .await
            .map_err(super::db_failure("Failed to reset password"))?
            .is_some();
        debug!("Password reset requested (known address: {})", known);
        Ok(ApiResponse::message_only(RESET_PASSWORD_MESSAGE))
    }

    async fn register_user(&self, request: RegisterRequest) -> Result<AuthPayload, AuthError> {
        let email = normalize_email(&request.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(&request.password).await?;
        let user = self
            .users
            .create(NewUser {
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                email,
                password_hash,
                role: UserRole::Member,
                avatar: request.avatar,
            })
            .await?;

        let token = generate_jwt(&Claims::for_user(&user))?;
        Ok(AuthPayload { user, token })
    }

    /// Unknown email, wrong password and deactivated account are indistinguishable
    async fn authenticate(&self, request: LoginRequest) -> Result<AuthPayload, AuthError> {
        let email = normalize_email(&request.email);
        let Some(record) = self.users.find_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&request.password, &record.password).await? || !record.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let user = User::from(record);
        let token = generate_jwt(&Claims::for_user(&user))?;
        Ok(AuthPayload { user, token })
    }

    async fn replace_password(&self, user_id: i32, request: ChangePasswordRequest) -> Result<(), AuthError> {
        let record = self.users.find_record(user_id).await?.ok_or(AuthError::UserNotFound)?;

        if !verify_password(&request.current_password, &record.password).await? {
            return Err(AuthError::IncorrectPassword);
        }

        let password_hash = hash_password(&request.new_password).await?;
        self.users.update_password(user_id, &password_hash).await?;
        Ok(())
    }
}
