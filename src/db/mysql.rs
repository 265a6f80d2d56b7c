//! MySQL executor implementation.
//!
//! One connection per call: opened, used, closed on every path. TLS is
//! negotiated when the server offers it but self-signed certificates are
//! not rejected (`Preferred` mode), favoring connectivity to user-supplied
//! hosts over certificate validation.

use crate::db::summary::{build_summary, DescribedTable, MAX_DESCRIBED_TABLES};
use crate::db::{ConnectionParams, DatabaseExecutor, QueryResult, Row, SchemaSummary, Value};
use crate::error::{QuerionError, Result};
use crate::safety;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow, MySqlSslMode};
use sqlx::{Column as SqlxColumn, ConnectOptions, Connection as SqlxConnection, Executor};
use sqlx::{Row as SqlxRow, Statement, TypeInfo};
use std::time::Duration;
use tracing::{debug, warn};

/// Connect timeout for schema introspection.
const SCHEMA_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connect timeout for connection probes.
const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// MySQL implementation of [`DatabaseExecutor`].
#[derive(Debug, Default, Clone)]
pub struct MySqlExecutor;

impl MySqlExecutor {
    pub fn new() -> Self {
        Self
    }

    fn connect_options(params: &ConnectionParams) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.password)
            .database(&params.database)
            .ssl_mode(MySqlSslMode::Preferred)
    }

    /// Opens a single connection, returning the driver message on failure.
    async fn open(
        params: &ConnectionParams,
        timeout: Option<Duration>,
    ) -> std::result::Result<MySqlConnection, String> {
        let options = Self::connect_options(params);
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, options.connect()).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!(
                    "Connection to {}:{} timed out after {}s",
                    params.host,
                    params.port,
                    limit.as_secs()
                )),
            },
            None => options.connect().await.map_err(|e| e.to_string()),
        }
    }

    /// Lists tables and describes the first [`MAX_DESCRIBED_TABLES`] of them.
    async fn introspect(
        conn: &mut MySqlConnection,
    ) -> std::result::Result<SchemaSummary, String> {
        let table_rows = sqlx::query("SHOW TABLES")
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| e.to_string())?;

        let table_names: Vec<String> = table_rows
            .iter()
            .filter_map(|row| get_text(row, 0))
            .collect();

        debug!(table_count = table_names.len(), "Fetched table list");

        if table_names.is_empty() {
            return Ok(SchemaSummary::Empty);
        }

        let mut described = Vec::new();
        for table in table_names.iter().take(MAX_DESCRIBED_TABLES) {
            let describe_sql = format!("DESCRIBE {}", quote_ident(table));
            match sqlx::query(&describe_sql).fetch_all(&mut *conn).await {
                Ok(column_rows) => {
                    let columns = column_rows
                        .iter()
                        .filter_map(|row| Some((get_text(row, 0)?, get_text(row, 1)?)))
                        .collect();
                    described.push(DescribedTable {
                        name: table.clone(),
                        columns,
                    });
                }
                Err(e) => {
                    // A single undescribable table must not sink the summary.
                    warn!("Could not describe table {table}: {e}");
                }
            }
        }

        Ok(SchemaSummary::Tables(build_summary(&table_names, &described)))
    }
}

#[async_trait]
impl DatabaseExecutor for MySqlExecutor {
    async fn fetch_schema(&self, params: &ConnectionParams) -> SchemaSummary {
        let mut conn = match Self::open(params, Some(SCHEMA_CONNECT_TIMEOUT)).await {
            Ok(conn) => conn,
            Err(message) => {
                warn!("Schema fetch could not connect: {message}");
                return SchemaSummary::Failed(with_auth_hint(message));
            }
        };

        let outcome = Self::introspect(&mut conn).await;
        let _ = conn.close().await;

        match outcome {
            Ok(summary) => summary,
            Err(message) => {
                warn!("Schema introspection failed: {message}");
                SchemaSummary::Failed(with_auth_hint(message))
            }
        }
    }

    async fn run_read_only(&self, params: &ConnectionParams, sql: &str) -> Result<QueryResult> {
        // The gate runs before any connection is opened.
        safety::ensure_read_only(sql)?;

        let mut conn = Self::open(params, None)
            .await
            .map_err(|message| QuerionError::execution(format!("Database Error: {message}")))?;

        // Prepared metadata gives column names even for empty result sets.
        let columns: Vec<String> = match conn.prepare(sql).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect(),
            Err(e) => {
                let _ = conn.close().await;
                return Err(QuerionError::execution(format!("Database Error: {e}")));
            }
        };

        let fetched = sqlx::query(sql).fetch_all(&mut conn).await;
        let _ = conn.close().await;

        let rows = fetched
            .map_err(|e| QuerionError::execution(format!("Database Error: {e}")))?
            .iter()
            .map(convert_row)
            .collect();

        Ok(QueryResult { columns, rows })
    }

    async fn probe(&self, params: &ConnectionParams) -> Result<()> {
        let conn = Self::open(params, Some(PROBE_CONNECT_TIMEOUT))
            .await
            .map_err(QuerionError::connection)?;
        let _ = conn.close().await;
        Ok(())
    }
}

/// Appends a recovery hint when the driver message points at bad credentials.
fn with_auth_hint(message: String) -> String {
    if message.contains("Access denied") {
        format!(
            "{message} TIP: This usually means the password is wrong or was encrypted \
             with an old version of the app. Try deleting and re-creating this connection."
        )
    } else {
        message
    }
}

/// Escapes a table name for use in DESCRIBE.
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Reads a text-ish column that some servers report as a blob type.
fn get_text(row: &MySqlRow, index: usize) -> Option<String> {
    if let Ok(value) = row.try_get::<String, _>(index) {
        return Some(value);
    }
    row.try_get::<Vec<u8>, _>(index)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "TINYINT" => decode_int::<i8>(row, index),
        "SMALLINT" => decode_int::<i16>(row, index),
        "MEDIUMINT" | "INT" => decode_int::<i32>(row, index),
        "BIGINT" => decode_int::<i64>(row, index),

        "TINYINT UNSIGNED" => decode_uint::<u8>(row, index),
        "SMALLINT UNSIGNED" => decode_uint::<u16>(row, index),
        "MEDIUMINT UNSIGNED" | "INT UNSIGNED" => decode_uint::<u32>(row, index),
        "BIGINT UNSIGNED" => decode_uint::<u64>(row, index),

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "DECIMAL" => row
            .try_get::<Option<BigDecimal>, _>(index)
            .ok()
            .flatten()
            .and_then(|v| v.to_f64())
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "DATETIME" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIMESTAMP" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339()))
            .unwrap_or(Value::Null),

        "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BIT"
        | "GEOMETRY" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // Everything else (CHAR, VARCHAR, TEXT variants, ENUM, SET, JSON)
        // comes through as text.
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

fn decode_int<'r, T>(row: &'r MySqlRow, index: usize) -> Value
where
    T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql> + Into<i64>,
{
    row.try_get::<Option<T>, _>(index)
        .ok()
        .flatten()
        .map(|v| Value::Int(v.into()))
        .unwrap_or(Value::Null)
}

fn decode_uint<'r, T>(row: &'r MySqlRow, index: usize) -> Value
where
    T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql> + TryInto<i64>,
{
    row.try_get::<Option<T>, _>(index)
        .ok()
        .flatten()
        .and_then(|v| v.try_into().ok())
        .map(Value::Int)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_backticks() {
        assert_eq!(quote_ident("users"), "`users`");
        assert_eq!(quote_ident("odd`name"), "`odd``name`");
    }

    #[test]
    fn test_auth_hint_applied_only_for_access_denied() {
        let hinted = with_auth_hint("Access denied for user 'x'@'%'".to_string());
        assert!(hinted.contains("TIP:"));

        let plain = with_auth_hint("Unknown database 'shop'".to_string());
        assert!(!plain.contains("TIP:"));
    }

    // Live-server coverage. Skipped unless QUERION_TEST_MYSQL_URL points at
    // a reachable MySQL instance, mirroring how CI opts in.
    fn test_params() -> Option<ConnectionParams> {
        let url = std::env::var("QUERION_TEST_MYSQL_URL").ok()?;
        let parsed = url::Url::parse(&url).ok()?;
        Some(ConnectionParams {
            host: parsed.host_str()?.to_string(),
            port: parsed.port().unwrap_or(3306),
            database: parsed.path().trim_start_matches('/').to_string(),
            user: parsed.username().to_string(),
            password: parsed.password().unwrap_or_default().to_string(),
        })
    }

    #[tokio::test]
    async fn test_probe_live() {
        let Some(params) = test_params() else {
            eprintln!("Skipping test: QUERION_TEST_MYSQL_URL not set");
            return;
        };
        MySqlExecutor::new().probe(&params).await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_select_live() {
        let Some(params) = test_params() else {
            eprintln!("Skipping test: QUERION_TEST_MYSQL_URL not set");
            return;
        };

        let result = MySqlExecutor::new()
            .run_read_only(&params, "SELECT 1 AS num, 'hello' AS greeting")
            .await
            .unwrap();

        assert_eq!(result.columns, vec!["num", "greeting"]);
        assert_eq!(result.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_before_connecting_live() {
        // Host is unroutable; a rejection proves no connection was attempted.
        let params = ConnectionParams {
            host: "host.invalid".to_string(),
            port: 3306,
            database: "shop".to_string(),
            user: "nobody".to_string(),
            password: String::new(),
        };

        let err = MySqlExecutor::new()
            .run_read_only(&params, "DROP TABLE users")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "security");
    }
}
