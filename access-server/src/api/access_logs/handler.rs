//! Access Log API Handlers
//!
//! Date filters arrive as `YYYY-MM-DD` and expand to inclusive
//! local-day bounds.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use shared::models::{AccessLogEntry, AccessLogQuery, AccessOutcome, AccessStats};

use crate::core::ServerState;
use crate::utils::time::{day_end_millis, day_start_millis, parse_date};
use crate::utils::{AppError, AppResult};

const RECENT_DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct LogQueryParams {
    /// Inclusive start date, `YYYY-MM-DD`
    pub from: Option<String>,
    /// Inclusive end date, `YYYY-MM-DD`
    pub to: Option<String>,
    pub outcome: Option<AccessOutcome>,
    pub member_id: Option<i64>,
    /// Substring match
    pub card_uid: Option<String>,
    pub limit: Option<usize>,
}

impl LogQueryParams {
    pub fn into_query(self) -> Result<AccessLogQuery, AppError> {
        let from = self
            .from
            .as_deref()
            .map(parse_date)
            .transpose()?
            .map(day_start_millis);
        let to = self
            .to
            .as_deref()
            .map(parse_date)
            .transpose()?
            .map(day_end_millis);
        Ok(AccessLogQuery {
            from,
            to,
            outcome: self.outcome,
            member_id: self.member_id,
            card_uid: self.card_uid,
            limit: self.limit,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// GET /api/access-logs - filtered, newest first
pub async fn query(
    State(state): State<ServerState>,
    Query(params): Query<LogQueryParams>,
) -> AppResult<Json<Vec<AccessLogEntry>>> {
    let q = params.into_query()?;
    let logs = state.access_logs.query(&q).await?;
    Ok(Json(logs))
}

/// GET /api/access-logs/recent
pub async fn recent(
    State(state): State<ServerState>,
    Query(params): Query<RecentQuery>,
) -> AppResult<Json<Vec<AccessLogEntry>>> {
    let limit = params.limit.unwrap_or(RECENT_DEFAULT_LIMIT);
    let logs = state.access_logs.recent(limit).await?;
    Ok(Json(logs))
}

/// GET /api/access-logs/stats - counters over the same filters
pub async fn stats(
    State(state): State<ServerState>,
    Query(params): Query<LogQueryParams>,
) -> AppResult<Json<AccessStats>> {
    let q = params.into_query()?;
    let stats = state.access_logs.stats(&q).await?;
    Ok(Json(stats))
}
