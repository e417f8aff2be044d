pub mod config;
pub mod error;
pub mod validation;
pub mod filter;
pub mod database;
pub mod auth;
pub mod middleware;
pub mod repository;
pub mod services;
pub mod handlers;
pub mod state;
pub mod app;

#[cfg(test)]
pub mod testing;
