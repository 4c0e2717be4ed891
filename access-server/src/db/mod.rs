//! Database Module
//!
//! Embedded SurrealDB (RocksDB backend). The schema is defined with
//! idempotent DEFINE statements at startup; there is no external
//! migration tooling.

pub mod repository;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use crate::utils::AppError;

/// Database service that owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the database at `db_path` and define the schema
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;
        db.use_ns("gym")
            .use_db("access")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        define_schema(&db)
            .await
            .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;

        tracing::info!("Database ready (SurrealDB/RocksDB at {db_path})");
        Ok(Self { db })
    }
}

/// Idempotent table and index definitions.
///
/// Also used by integration tests against tempdir instances.
pub async fn define_schema(db: &Surreal<Db>) -> Result<(), surrealdb::Error> {
    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS member SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_member_id ON TABLE member FIELDS member_id UNIQUE;

        DEFINE TABLE IF NOT EXISTS access_log SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_access_log_ts ON TABLE access_log FIELDS timestamp;
        "#,
    )
    .await?;
    Ok(())
}
