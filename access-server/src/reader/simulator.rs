//! Simulated Card Reader
//!
//! Development stand-in for the serial reader. Emits a random card UID
//! on a fixed interval until the shutdown token fires. UIDs are random,
//! so almost every scan exercises the unknown-card path; registered
//! cards are exercised through the scan API instead.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::ReaderEvent;

pub struct SimulatedReader {
    interval: std::time::Duration,
}

impl SimulatedReader {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval: std::time::Duration::from_secs(interval_secs),
        }
    }

    /// Emit events until cancellation. Stops early if the receiver side
    /// is dropped.
    pub async fn run(self, tx: mpsc::Sender<ReaderEvent>, shutdown: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Simulated reader started"
        );

        if tx.send(ReaderEvent::Connected(true)).await.is_err() {
            return;
        }

        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately; skip it so the first card
        // arrives one full interval after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Simulated reader stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let uid = random_card_uid();
                    tracing::debug!(card_uid = %uid, "Simulated card presented");
                    if tx.send(ReaderEvent::CardRead(uid)).await.is_err() {
                        tracing::warn!("Reader channel closed, simulator stopping");
                        break;
                    }
                }
            }
        }
    }
}

/// 8 hex chars, the shape of a 4-byte MIFARE UID
fn random_card_uid() -> String {
    format!("{:08X}", rand::random::<u32>())
}
