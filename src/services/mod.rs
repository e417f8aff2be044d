//! Business rules: authorization, existence checks and the mapping of
//! persistence failures onto client responses.

pub mod auth_service;
pub mod category_service;
pub mod project_service;
pub mod task_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use category_service::CategoryService;
pub use project_service::ProjectService;
pub use task_service::TaskService;
pub use user_service::UserService;

use crate::database::DatabaseError;
use crate::error::ApiError;

/// Map a persistence failure onto the response for `action`.
///
/// `NotFound` keeps its message as a 404; anything else is logged and
/// answered with a 500 carrying `action` as the message.
pub(crate) fn db_failure(action: &'static str) -> impl Fn(DatabaseError) -> ApiError {
    move |err| match err {
        DatabaseError::NotFound(message) => ApiError::not_found(message),
        other => {
            tracing::error!("{}: {}", action, other);
            ApiError::internal_server_error(action)
        }
    }
}

/// Emails are compared and stored trimmed and lowercased
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn insufficient_permissions() -> ApiError {
    ApiError::forbidden("Insufficient permissions")
}
