// handlers/protected/mod.rs - Endpoints behind `jwt_auth_middleware`
//
// Every handler here receives the caller as `Extension<AuthUser>`.

pub mod auth;
pub mod categories;
pub mod projects;
pub mod tasks;
pub mod users;
