//! Export API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/export", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/members.csv", get(handler::members_csv))
        .route("/access-logs.csv", get(handler::access_logs_csv))
}
