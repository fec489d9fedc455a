//! HTTP API module.
//!
//! Exposes the task service over JSON/HTTP with axum.

pub mod auth;
mod server;

pub use auth::{CurrentUser, USER_ID_HEADER};
pub use server::{ApiServer, ServerHandle, build_router, start_server, status_for};
