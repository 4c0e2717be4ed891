//! API Route Module
//!
//! # Structure
//!
//! - [`health`] - liveness check
//! - [`members`] - member management and card binding
//! - [`access`] - scan processing, checks, manual admission, live feed
//! - [`access_logs`] - access log queries and statistics
//! - [`export`] - CSV exports

pub mod access;
pub mod access_logs;
pub mod export;
pub mod health;
pub mod members;

use axum::Router;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Assemble every resource router. Layers (CORS, tracing) are applied
/// by the server after `with_state`.
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(members::router())
        .merge(access::router())
        .merge(access_logs::router())
        .merge(export::router())
}
