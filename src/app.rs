use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue,
    },
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{config, SecurityConfig};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full application router with global layers applied
pub fn router(state: AppState) -> Router {
    let config = config();

    Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::{auth, health};

    Router::new()
        .route("/", get(health::root))
        .route("/health-check", get(health::health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/reset-password", post(auth::reset_password))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(project_routes())
        .merge(task_routes())
        .merge(category_routes())
        // route_layer so unknown paths still fall through to a 404
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        .route("/auth/logout", post(auth::logout))
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/users", post(users::create).get(users::list))
        .route("/users/simple", get(users::list_simple))
        .route("/users/me", get(users::me))
        .route("/users/:id", get(users::get).put(users::update).delete(users::delete))
        .route("/users/:id/profile", get(users::profile))
}

fn project_routes() -> Router<AppState> {
    use axum::routing::delete;
    use protected::projects;

    Router::new()
        .route("/projects", post(projects::create).get(projects::list))
        .route("/projects/my-projects", get(projects::my_projects))
        .route(
            "/projects/:id",
            get(projects::get).put(projects::update).delete(projects::delete),
        )
        .route("/projects/:id/members", post(projects::add_members))
        .route("/projects/:id/members/:member_id", delete(projects::remove_member))
        .route("/projects/:id/members/:member_id/role", patch(projects::update_member_role))
        .route(
            "/projects/:id/comments",
            get(projects::list_comments).post(projects::create_comment),
        )
        .route("/projects/:id/comments/:comment_id", delete(projects::delete_comment))
}

fn task_routes() -> Router<AppState> {
    use axum::routing::delete;
    use protected::tasks;

    Router::new()
        .route("/tasks", post(tasks::create).get(tasks::list))
        .route("/tasks/my-tasks", get(tasks::my_tasks))
        .route("/tasks/overdue", get(tasks::overdue))
        .route("/tasks/:id", get(tasks::get).put(tasks::update).delete(tasks::delete))
        .route("/tasks/:id/toggle-complete", patch(tasks::toggle_complete))
        .route("/tasks/:id/comments", post(tasks::add_comment))
        .route(
            "/tasks/:id/comments/:comment_id",
            put(tasks::update_comment).delete(tasks::delete_comment),
        )
        .route("/tasks/:id/attachments", post(tasks::add_attachment))
        .route("/tasks/:id/attachments/:attachment_id", delete(tasks::delete_attachment))
}

fn category_routes() -> Router<AppState> {
    use protected::categories;

    Router::new()
        .route("/categories", post(categories::create).get(categories::list))
        .route("/categories/global", get(categories::list_global))
        .route("/categories/my-categories", get(categories::my_categories))
        .route(
            "/categories/:id",
            get(categories::get).put(categories::update).delete(categories::delete),
        )
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Permissive in development, the configured origin list elsewhere
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if crate::is_development!() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
