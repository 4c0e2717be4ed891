//! Core Module
//!
//! Configuration, shared server state, the HTTP server itself and the
//! background task registry.

pub mod config;
pub mod server;
pub mod state;
pub mod tasks;

// Re-exports
pub use config::Config;
pub use server::Server;
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind};
