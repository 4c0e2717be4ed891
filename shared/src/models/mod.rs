//! Data models
//!
//! Shared between the access server and its API consumers.
//! All IDs are snowflake-style `i64`.

pub mod access_log;
pub mod member;

// Re-exports
pub use access_log::*;
pub use member::*;
