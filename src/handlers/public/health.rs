// handlers/public/health.rs - GET / and GET /health-check

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

/// Service banner with the route prefixes
pub async fn root() -> ApiResponse<Value> {
    ApiResponse::success(
        "Taskflow API is running",
        json!({
            "name": "Taskflow API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health-check (public)",
                "auth": "/auth/register, /auth/login, /auth/reset-password (public); /auth/me, /auth/change-password, /auth/logout",
                "users": "/users[/:id]",
                "projects": "/projects[/:id][/members|/comments]",
                "tasks": "/tasks[/:id][/comments|/attachments|/toggle-complete]",
                "categories": "/categories[/:id]",
            }
        }),
    )
}

/// Pings the pool; an unreachable database is a 503
pub async fn health_check(State(state): State<AppState>) -> Response {
    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => ApiResponse::success(
            "Service is healthy",
            json!({ "status": "healthy", "database": "connected", "timestamp": Utc::now() }),
        )
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ApiError::service_unavailable("Service is unhealthy").into_response()
        }
    }
}
