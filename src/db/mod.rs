//! Database access layer for Querion.
//!
//! Defines the executor trait the pipeline is built against, the ephemeral
//! connection parameters, and the MySQL implementation. Connections are
//! opened per call and closed before returning; nothing is pooled or shared
//! between pipeline runs.

mod mock;
mod mysql;
mod summary;
mod types;

pub use mock::MockExecutor;
pub use mysql::MySqlExecutor;
pub use summary::SchemaSummary;
pub use types::{QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Decrypted connection parameters for one schema-fetch or execute call.
///
/// Built from a stored connection right before use and dropped with the
/// call that created it; never persisted or logged with the password.
#[derive(Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"******")
            .finish()
    }
}

/// Interface for target-database operations.
///
/// The pipeline receives an executor by injection so tests can run against
/// [`MockExecutor`] without a live server.
#[async_trait]
pub trait DatabaseExecutor: Send + Sync {
    /// Produces a bounded schema summary for the given connection.
    ///
    /// Never fails at the type level; connection problems come back as
    /// [`SchemaSummary::Failed`].
    async fn fetch_schema(&self, params: &ConnectionParams) -> SchemaSummary;

    /// Enforces the read-only policy, then executes `sql` once.
    async fn run_read_only(&self, params: &ConnectionParams, sql: &str) -> Result<QueryResult>;

    /// Opens and immediately closes a connection to verify the parameters.
    async fn probe(&self, params: &ConnectionParams) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let params = ConnectionParams {
            host: "db.example.com".to_string(),
            port: 3306,
            database: "shop".to_string(),
            user: "reporting".to_string(),
            password: "top-secret".to_string(),
        };

        let debug = format!("{params:?}");
        assert!(!debug.contains("top-secret"));
        assert!(debug.contains("******"));
        assert!(debug.contains("db.example.com"));
    }
}
