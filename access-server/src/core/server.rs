//! Server Implementation
//!
//! Wires the background tasks (plan sweep, reader, access worker) to
//! the HTTP API and runs until ctrl-c.

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, ServerState};
use crate::reader::{AccessWorker, ReaderEvent, SimulatedReader};
use crate::utils::AppError;

/// Buffered reader events before the source blocks
const READER_CHANNEL_CAPACITY: usize = 64;

pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Reuse an already initialized state, used by tests
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let mut tasks = BackgroundTasks::new();
        spawn_background_tasks(&mut tasks, &state);
        tasks.log_summary();

        let app = crate::api::build_app()
            .with_state(state.clone())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        tracing::info!("Access server listening on {addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        tasks.shutdown().await;
        Ok(())
    }
}

/// Register the startup sweep and, when simulation is enabled, the
/// reader source plus its worker.
fn spawn_background_tasks(tasks: &mut BackgroundTasks, state: &ServerState) {
    let members = state.members.clone();
    tasks.spawn("expired_plan_sweep", TaskKind::Warmup, async move {
        match members.deactivate_expired_plans().await {
            Ok(0) => tracing::info!("No expired plans to deactivate"),
            Ok(n) => tracing::info!(count = n, "Deactivated members with expired plans"),
            Err(e) => tracing::error!(error = %e, "Expired plan sweep failed"),
        }
    });

    if state.config.reader_simulate {
        let (tx, rx) = tokio::sync::mpsc::channel::<ReaderEvent>(READER_CHANNEL_CAPACITY);

        let worker = AccessWorker::new(state.engine.clone(), state.access_events.clone());
        tasks.spawn(
            "access_worker",
            TaskKind::Worker,
            worker.run(rx, tasks.shutdown_token()),
        );

        let reader = SimulatedReader::new(state.config.reader_interval_secs);
        tasks.spawn(
            "simulated_reader",
            TaskKind::Periodic,
            reader.run(tx, tasks.shutdown_token()),
        );
    } else {
        tracing::info!("Card reader disabled; scans arrive through the API only");
    }
}
