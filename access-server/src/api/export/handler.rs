//! Export API Handlers
//!
//! CSV downloads. The access-log export accepts the same filters as
//! the log query endpoint.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};

use crate::api::access_logs::LogQueryParams;
use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::export::{access_logs_to_csv, members_to_csv};

fn csv_response(filename: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
}

/// GET /api/export/members.csv
pub async fn members_csv(State(state): State<ServerState>) -> AppResult<impl IntoResponse> {
    let members = state.members.find_all().await?;
    tracing::info!(count = members.len(), "Exporting members as CSV");
    Ok(csv_response("members.csv", members_to_csv(&members)))
}

/// GET /api/export/access-logs.csv
pub async fn access_logs_csv(
    State(state): State<ServerState>,
    Query(params): Query<LogQueryParams>,
) -> AppResult<impl IntoResponse> {
    let q = params.into_query()?;
    let logs = state.access_logs.query(&q).await?;
    tracing::info!(count = logs.len(), "Exporting access logs as CSV");
    Ok(csv_response("access-logs.csv", access_logs_to_csv(&logs)))
}
