use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ApiError;
use crate::validation::{FieldErrors, Validate};

text_enum! {
    /// Global role, independent of project membership roles
    UserRole {
        Admin => "admin",
        ProjectManager => "project_manager",
        Member => "member",
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Member
    }
}

/// Full `users` row including the password hash. Deliberately not `Serialize`.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public user representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            role: record.role,
            avatar: record.avatar,
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub user: User,
    pub projects_count: i64,
    pub tasks_count: i64,
    pub completed_tasks_count: i64,
}

/// Insert payload; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub avatar: Option<String>,
}

/// POST /users body (admin only)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    pub avatar: Option<String>,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.length("firstName", &self.first_name, 1, 255, "First name is required");
        errors.length("lastName", &self.last_name, 1, 255, "Last name is required");
        errors.email("email", &self.email);
        errors.min_chars("password", &self.password, 8, "Password must be at least 8 characters");
        if let Some(avatar) = &self.avatar {
            errors.http_url("avatar", avatar, "Avatar must be a valid URL");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub avatar: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    /// Fields only an administrator may change
    pub fn touches_privileged_fields(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.optional_length("firstName", self.first_name.as_deref(), 1, 255, "First name is required");
        errors.optional_length("lastName", self.last_name.as_deref(), 1, 255, "Last name is required");
        if let Some(email) = &self.email {
            errors.email("email", email);
        }
        if let Some(avatar) = &self.avatar {
            errors.http_url("avatar", avatar, "Avatar must be a valid URL");
        }
        errors.finish()
    }
}

/// GET /users query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub role: Option<UserRole>,
    pub search: Option<String>,
}
