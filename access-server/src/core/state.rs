//! Server State
//!
//! Holds shared references to every service. Clone is shallow, every
//! field is either `Clone`-cheap or behind an `Arc`.

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio::sync::broadcast;

use crate::access::{AccessCheckResult, AccessEngine};
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::{AccessLogRepository, MemberRepository};
use crate::reader::{DoorActuator, SimulatedActuator};
use crate::utils::AppError;

/// Capacity of the access-event broadcast channel; slow watchers lag,
/// they never block the worker.
const ACCESS_EVENT_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub members: MemberRepository,
    pub access_logs: AccessLogRepository,
    pub engine: Arc<AccessEngine>,
    /// Fan-out of every processed access attempt (reader and API paths)
    pub access_events: broadcast::Sender<AccessCheckResult>,
}

impl ServerState {
    /// Initialize in order: working directory, database, repositories,
    /// authorization engine.
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {e}")))?;

        let db_path = config.database_dir().join("access.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;
        let db = db_service.db;

        let members = MemberRepository::new(db.clone());
        let access_logs = AccessLogRepository::new(db.clone());

        let actuator: Arc<dyn DoorActuator> = Arc::new(SimulatedActuator);
        let engine = Arc::new(AccessEngine::new(
            members.clone(),
            access_logs.clone(),
            actuator,
        ));

        let (access_events, _) = broadcast::channel(ACCESS_EVENT_CAPACITY);

        Ok(Self {
            config: config.clone(),
            db,
            members,
            access_logs,
            engine,
            access_events,
        })
    }

    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// Live feed of processed access attempts
    pub fn subscribe_access_events(&self) -> broadcast::Receiver<AccessCheckResult> {
        self.access_events.subscribe()
    }
}
