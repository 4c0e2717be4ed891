//! Access Log API Module

mod handler;

pub use handler::LogQueryParams;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/access-logs", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::query))
        .route("/recent", get(handler::recent))
        .route("/stats", get(handler::stats))
}
