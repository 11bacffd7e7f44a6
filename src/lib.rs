//! User account API: registration and bearer-token authentication over axum.

pub mod app;
pub mod config;
pub mod error;
pub mod state;
pub mod user;
