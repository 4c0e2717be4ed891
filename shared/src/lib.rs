//! Shared types for the gym access-control service
//!
//! Data models and utility types consumed by the access server.
//! All IDs are snowflake-style `i64`, timestamps are Unix millis `i64`,
//! calendar dates are `chrono::NaiveDate`.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
