// handlers/public/mod.rs - Endpoints reachable without a token
//
// Banner, health check and the credential flows that hand out tokens.

pub mod auth;
pub mod health;
