//! Access domain logic
//!
//! - [`plan`] - pure membership plan date policy
//! - [`engine`] - the access authorization pipeline

pub mod engine;
pub mod plan;

pub use engine::{AccessCheckResult, AccessDecision, AccessEngine};
