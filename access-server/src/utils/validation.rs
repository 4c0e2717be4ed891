//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SurrealDB has no built-in length enforcement, so limits are applied
//! before any write.

use crate::db::repository::RepoError;

// ── Text length limits ──────────────────────────────────────────────

/// Member first/last names
pub const MAX_NAME_LEN: usize = 200;

/// Notes and manual-admission notes
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, card UID
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty after trimming and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), RepoError> {
    if value.trim().is_empty() {
        return Err(RepoError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(RepoError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), RepoError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(RepoError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}
