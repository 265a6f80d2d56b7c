//! Local SQLite storage for saved connections.
//!
//! Passwords are encrypted by the caller before they reach this layer; the
//! store never sees plaintext credentials.

mod connections;
mod migrations;

pub use connections::{ConnectionRecord, ConnectionSummary, NewConnection};

use crate::error::{QuerionError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// The connection store, backed by a single-connection SQLite pool.
pub struct ConnectionStore {
    pool: SqlitePool,
}

impl ConnectionStore {
    /// Opens or creates the store at the given path.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuerionError::store(format!(
                    "Failed to create data directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn_str = format!("sqlite:{}?mode=rwc", path.display());
        let options = SqliteConnectOptions::from_str(&conn_str)
            .map_err(|e| QuerionError::store(format!("Invalid store path: {e}")))?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = Self::connect(options).await?;
        migrations::run_migrations(&pool).await?;
        info!("Connection store opened at {}", path.display());

        Ok(Self { pool })
    }

    /// Opens an in-memory store, used in tests.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| QuerionError::store(format!("Invalid store path: {e}")))?;

        let pool = Self::connect(options).await?;
        migrations::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    async fn connect(options: SqliteConnectOptions) -> Result<SqlitePool> {
        SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| QuerionError::store(format!("Failed to open connection store: {e}")))
    }

    /// Saves a new connection and returns the stored record.
    pub async fn create(&self, new: NewConnection) -> Result<ConnectionRecord> {
        connections::create(&self.pool, new).await
    }

    /// Lists saved connections without their passwords.
    pub async fn list(&self) -> Result<Vec<ConnectionSummary>> {
        connections::list(&self.pool).await
    }

    /// Fetches a connection by id, password included.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<ConnectionRecord>> {
        connections::find_by_id(&self.pool, id).await
    }

    /// Default store path for the current platform.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| QuerionError::store("Could not determine config directory"))?;
        Ok(config_dir.join("querion").join("store.db"))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
