//! Member API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use shared::models::{AccessLogEntry, Member, MemberCreate, MemberSearch, MemberUpdate};

use crate::access::plan;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Default row cap for a member's access history
const HISTORY_DEFAULT_LIMIT: usize = 100;

/// Member plus derived plan status, the shape every member endpoint
/// returns
#[derive(Debug, Serialize)]
pub struct MemberView {
    #[serde(flatten)]
    pub member: Member,
    pub is_vigent: bool,
    pub days_remaining: i64,
    pub plan_status: String,
}

impl From<Member> for MemberView {
    fn from(member: Member) -> Self {
        let is_vigent = member.is_vigent();
        let days_remaining = member.days_remaining();
        let plan_status = plan::plan_status_text(member.plan_end);
        Self {
            member,
            is_vigent,
            days_remaining,
            plan_status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignCardRequest {
    pub card_uid: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// GET /api/members - all members, ordered by name
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<MemberView>>> {
    let members = state.members.find_all().await?;
    Ok(Json(members.into_iter().map(MemberView::from).collect()))
}

/// GET /api/members/search - filtered search, filters AND together
pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<MemberSearch>,
) -> AppResult<Json<Vec<MemberView>>> {
    let members = state.members.search(&query).await?;
    Ok(Json(members.into_iter().map(MemberView::from).collect()))
}

/// GET /api/members/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MemberView>> {
    let member = state
        .members
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", id)))?;
    Ok(Json(member.into()))
}

/// POST /api/members
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<MemberCreate>,
) -> AppResult<Json<MemberView>> {
    let member = state.members.create(payload).await?;
    tracing::info!(member_id = member.id, name = %member.full_name(), "Member created");
    Ok(Json(member.into()))
}

/// PUT /api/members/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MemberUpdate>,
) -> AppResult<Json<MemberView>> {
    let member = state.members.update(id, payload).await?;
    tracing::info!(member_id = id, "Member updated");
    Ok(Json(member.into()))
}

/// DELETE /api/members/:id - hard delete; access log rows stay behind
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let deleted = state.members.delete(id).await?;
    tracing::info!(member_id = id, "Member deleted");
    Ok(Json(deleted))
}

/// PUT /api/members/:id/card - bind a card, rejecting UIDs held by
/// someone else
pub async fn assign_card(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<AssignCardRequest>,
) -> AppResult<Json<MemberView>> {
    let member = state.members.assign_card(id, &payload.card_uid).await?;
    tracing::info!(member_id = id, card_uid = %payload.card_uid, "Card assigned");
    Ok(Json(member.into()))
}

/// DELETE /api/members/:id/card - unbind; no-op when no card is bound
pub async fn remove_card(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MemberView>> {
    let member = state.members.remove_card(id).await?;
    tracing::info!(member_id = id, "Card removed");
    Ok(Json(member.into()))
}

/// GET /api/members/:id/access-logs - this member's attempts, newest
/// first
pub async fn access_history(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<AccessLogEntry>>> {
    // 404 for unknown members rather than an empty list
    state
        .members
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", id)))?;

    let limit = query.limit.unwrap_or(HISTORY_DEFAULT_LIMIT);
    let logs = state.access_logs.find_by_member(id, limit).await?;
    Ok(Json(logs))
}
