use serde::{Deserialize, Serialize};

use super::user::User;
use crate::error::ApiError;
use crate::validation::{FieldErrors, Validate};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.length("firstName", &self.first_name, 1, 255, "First name is required");
        errors.length("lastName", &self.last_name, 1, 255, "Last name is required");
        errors.email("email", &self.email);
        errors.min_chars("password", &self.password, 6, "Password must be at least 6 characters");
        if let Some(avatar) = &self.avatar {
            errors.http_url("avatar", avatar, "Avatar must be a valid URL");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.email("email", &self.email);
        errors.min_chars("password", &self.password, 6, "Password must be at least 6 characters");
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.length("currentPassword", &self.current_password, 1, usize::MAX, "Current password is required");
        errors.min_chars("newPassword", &self.new_password, 6, "New password must be at least 6 characters");
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.email("email", &self.email);
        errors.finish()
    }
}

/// `{user, token}` returned by register and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}
