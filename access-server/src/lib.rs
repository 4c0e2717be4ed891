//! Gym Access Server - single-site door access control node
//!
//! # Module structure
//!
//! ```text
//! access-server/src/
//! ├── core/     # Config, state, server, background tasks
//! ├── access/   # Plan policy and authorization engine
//! ├── reader/   # Card reader source, worker, door actuator
//! ├── api/      # HTTP routes and handlers
//! ├── db/       # Embedded SurrealDB and repositories
//! └── utils/    # Errors, logging, validation, CSV export
//! ```

pub mod access;
pub mod api;
pub mod core;
pub mod db;
pub mod reader;
pub mod utils;

// Re-export common types
pub use crate::core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env`, read the configuration and initialize logging.
///
/// Must run before anything emits tracing events.
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();
    let config = Config::from_env();

    if config.log_to_file {
        let _ = std::fs::create_dir_all(config.log_dir());
        init_logger_with_file(Some(&config.log_level), config.log_dir().to_str());
    } else {
        init_logger_with_file(Some(&config.log_level), None);
    }

    config
}
