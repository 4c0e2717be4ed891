//! Access API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/access", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/scan", post(handler::scan))
        .route("/check", post(handler::check))
        .route("/manual", post(handler::manual))
        .route("/live", get(handler::live))
}
