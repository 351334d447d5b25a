//! Server state

use chrono_tz::Tz;
use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;
use crate::utils::AppError;

/// Server state shared by all handlers. `Clone` is shallow (pool is an
/// internal `Arc`), so handing it to axum costs nothing.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
}

impl ServerState {
    /// Initialize the server state: work directory layout first, then the
    /// SQLite pool with migrations applied. An explicit startup step, not
    /// a lazily-checked init flag racing the first request.
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::Internal(format!("Failed to create work directory: {e}")))?;

        let db_path = config.database_dir().join("gate.db");
        let db = DbService::new(&db_path.to_string_lossy()).await?;

        Ok(Self {
            config: config.clone(),
            pool: db.pool,
        })
    }

    /// Venue timezone driving the same-day expiry rule.
    pub fn venue_tz(&self) -> Tz {
        self.config.ticketing.timezone
    }
}
