//! CRUD for saved connections.
//!
//! Records are created and read, never updated; a bad connection is deleted
//! and re-added. Listing goes through [`ConnectionSummary`], which has no
//! password field, so credentials cannot leak through the listing path.

use crate::error::{QuerionError, Result};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;
use uuid::Uuid;

/// A stored connection, password included (encrypted at rest).
#[derive(Debug, Clone, FromRow)]
pub struct ConnectionRecord {
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

/// A stored connection as exposed by listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConnectionSummary {
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub created_at: String,
}

/// Input for saving a connection. The password must already be encrypted.
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub name: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl NewConnection {
    /// The display name, defaulting to "database @ host".
    fn resolved_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("{} @ {}", self.database, self.host),
        }
    }
}

/// Inserts a new connection and returns the stored record.
pub async fn create(pool: &SqlitePool, new: NewConnection) -> Result<ConnectionRecord> {
    let id = Uuid::new_v4().to_string();
    let name = new.resolved_name();

    sqlx::query(
        r#"
        INSERT INTO connections (id, name, host, port, database, username, password)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&name)
    .bind(&new.host)
    .bind(new.port as i32)
    .bind(&new.database)
    .bind(&new.username)
    .bind(&new.password)
    .execute(pool)
    .await
    .map_err(|e| QuerionError::store(format!("Failed to save connection: {e}")))?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| QuerionError::store("Saved connection disappeared on readback"))
}

/// Lists all saved connections, newest first. Passwords are not selected.
pub async fn list(pool: &SqlitePool) -> Result<Vec<ConnectionSummary>> {
    sqlx::query_as(
        r#"
        SELECT id, name, host, port, database, username, created_at
        FROM connections
        ORDER BY created_at DESC, name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| QuerionError::store(format!("Failed to list connections: {e}")))
}

/// Fetches a connection by id.
pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<ConnectionRecord>> {
    sqlx::query_as(
        r#"
        SELECT id, name, host, port, database, username, password, created_at
        FROM connections
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| QuerionError::store(format!("Failed to fetch connection: {e}")))
}
