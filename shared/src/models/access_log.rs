//! Access Log Model
//!
//! Append-only: entries are never updated or deleted anywhere in the
//! codebase. A deleted member leaves its log rows behind; their
//! `member_id` simply no longer resolves.

use serde::{Deserialize, Serialize};

/// Final verdict of an access attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    Allowed,
    Denied,
}

/// Why the verdict came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    Ok,
    NotFound,
    Expired,
    Inactive,
    Manual,
}

impl AccessReason {
    /// The only outcome this reason may accompany
    pub fn implied_outcome(&self) -> AccessOutcome {
        match self {
            AccessReason::Ok | AccessReason::Manual => AccessOutcome::Allowed,
            AccessReason::NotFound | AccessReason::Expired | AccessReason::Inactive => {
                AccessOutcome::Denied
            }
        }
    }
}

/// One access attempt, exactly one row per attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub id: i64,
    /// Assigned inside the store at append time, never caller-supplied
    pub timestamp: i64,
    /// Card UID as presented; `MANUAL-<note>` for manual admissions
    pub card_uid: String,
    pub member_id: Option<i64>,
    pub outcome: AccessOutcome,
    pub reason: AccessReason,
}

/// Query filters; absent fields do not constrain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessLogQuery {
    /// Inclusive lower bound, Unix millis
    pub from: Option<i64>,
    /// Inclusive upper bound, Unix millis
    pub to: Option<i64>,
    pub outcome: Option<AccessOutcome>,
    pub member_id: Option<i64>,
    /// Substring match on card UID
    pub card_uid: Option<String>,
    /// Row cap, defaults to 500
    pub limit: Option<usize>,
}

/// Aggregate counters over a log query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessStats {
    pub total: u64,
    pub allowed: u64,
    pub denied: u64,
    /// allowed / total * 100, rounded to 2 decimals; 0.0 when total is 0
    pub allow_rate: f64,
}
