//! Access Worker
//!
//! Consumes [`ReaderEvent`]s from the mpsc channel, runs each card
//! through the authorization engine and broadcasts the result to
//! watchers (the live feed API). Exits when the channel closes or the
//! shutdown token fires; pending events are drained before exit so a
//! scan that reached the channel is never silently dropped.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::access::{AccessCheckResult, AccessEngine};

use super::ReaderEvent;

pub struct AccessWorker {
    engine: Arc<AccessEngine>,
    results: broadcast::Sender<AccessCheckResult>,
}

impl AccessWorker {
    pub fn new(engine: Arc<AccessEngine>, results: broadcast::Sender<AccessCheckResult>) -> Self {
        Self { engine, results }
    }

    pub async fn run(self, mut rx: mpsc::Receiver<ReaderEvent>, shutdown: CancellationToken) {
        tracing::info!("Access worker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    // Drain whatever already reached the channel
                    while let Ok(event) = rx.try_recv() {
                        self.handle(event).await;
                    }
                    tracing::info!("Access worker stopping");
                    break;
                }
                event = rx.recv() => {
                    match event {
                        Some(event) => self.handle(event).await,
                        None => {
                            tracing::info!("Reader channel closed, access worker stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle(&self, event: ReaderEvent) {
        match event {
            ReaderEvent::CardRead(card_uid) => {
                match self.engine.process_access(&card_uid).await {
                    Ok(result) => {
                        tracing::info!(
                            card_uid = %result.card_uid,
                            outcome = ?result.outcome,
                            reason = ?result.reason,
                            "Card processed"
                        );
                        // No watchers is fine
                        let _ = self.results.send(result);
                    }
                    Err(e) => {
                        tracing::error!(card_uid = %card_uid, error = %e, "Card processing failed");
                    }
                }
            }
            ReaderEvent::Connected(connected) => {
                if connected {
                    tracing::info!("Reader connected");
                } else {
                    tracing::warn!("Reader disconnected");
                }
            }
            ReaderEvent::Error(msg) => {
                tracing::warn!(error = %msg, "Reader fault");
            }
        }
    }
}
