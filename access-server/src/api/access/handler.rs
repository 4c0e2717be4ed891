//! Access API Handlers
//!
//! `scan` runs the full pipeline (log + door) and is also how a card
//! read is injected without hardware. `check` is a side-effect-free
//! preview. `live` streams every processed attempt as SSE.

use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::access::AccessCheckResult;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub card_uid: String,
}

#[derive(Debug, Deserialize)]
pub struct ManualRequest {
    #[serde(default)]
    pub note: String,
}

/// POST /api/access/scan - full pipeline: decide, log, open on allow
pub async fn scan(
    State(state): State<ServerState>,
    Json(payload): Json<ScanRequest>,
) -> AppResult<Json<AccessCheckResult>> {
    if payload.card_uid.trim().is_empty() {
        return Err(AppError::validation("card_uid must not be blank"));
    }

    let result = state.engine.process_access(&payload.card_uid).await?;
    tracing::info!(
        card_uid = %result.card_uid,
        outcome = ?result.outcome,
        reason = ?result.reason,
        "Card scanned via API"
    );
    let _ = state.access_events.send(result.clone());
    Ok(Json(result))
}

/// POST /api/access/check - preview only: no log row, door stays shut
pub async fn check(
    State(state): State<ServerState>,
    Json(payload): Json<ScanRequest>,
) -> AppResult<Json<AccessCheckResult>> {
    if payload.card_uid.trim().is_empty() {
        return Err(AppError::validation("card_uid must not be blank"));
    }

    let result = state.engine.check_access(&payload.card_uid).await?;
    Ok(Json(result))
}

/// POST /api/access/manual - staff override, always allowed and logged
pub async fn manual(
    State(state): State<ServerState>,
    Json(payload): Json<ManualRequest>,
) -> AppResult<Json<AccessCheckResult>> {
    let result = state.engine.register_manual_access(&payload.note).await?;
    tracing::info!(note = %payload.note, "Manual admission registered");
    let _ = state.access_events.send(result.clone());
    Ok(Json(result))
}

/// GET /api/access/live - SSE stream of processed attempts
pub async fn live(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe_access_events();

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(result) => match Event::default().json_data(&result) {
                    Ok(event) => return Some((Ok(event), rx)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping unserializable access event");
                        continue;
                    }
                },
                // A lagged watcher just misses events, the stream stays up
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Live feed lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
