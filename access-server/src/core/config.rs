//! Server Configuration
//!
//! Every setting can be overridden through the environment:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/gym/access | Working directory (database, logs) |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | READER_SIMULATE | true | Run the simulated card reader |
//! | READER_INTERVAL_SECS | 30 | Simulated reader scan interval |
//! | LOG_LEVEL | info | tracing filter directive |
//! | LOG_TO_FILE | false | Also write daily rolling log files |
//! | ENVIRONMENT | development | development \| staging \| production |

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Emit simulated card scans instead of reading hardware
    pub reader_simulate: bool,
    /// Seconds between simulated scans
    pub reader_interval_secs: u64,
    /// tracing filter directive
    pub log_level: String,
    /// Write daily rolling log files under `work_dir/logs`
    pub log_to_file: bool,
    /// development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from the environment, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/gym/access".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            reader_simulate: std::env::var("READER_SIMULATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            reader_interval_secs: std::env::var("READER_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_to_file: std::env::var("LOG_TO_FILE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Partial override on top of the environment, used by tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// `work_dir/database` - embedded database files
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// `work_dir/logs` - rolling log files
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create the working directory layout if missing
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
