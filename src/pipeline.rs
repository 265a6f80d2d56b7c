//! The end-to-end question-to-result pipeline.
//!
//! Strictly sequential per request: look up the connection, decrypt its
//! password, summarize the schema, generate SQL, execute it read-only,
//! then attach display metrics.

use crate::db::{ConnectionParams, DatabaseExecutor, QueryResult, Row};
use crate::error::{QuerionError, Result};
use crate::llm::SqlGenerator;
use crate::secrets::SecretCodec;
use crate::store::ConnectionStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// One question against one stored connection.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub connection_id: String,
    pub prompt: String,
}

/// Display heuristics computed over the result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMetrics {
    pub total_rows: usize,
    /// Sum of the first numeric column found in the first row, 0.0 when no
    /// column is numeric. A display heuristic, not an aggregation engine.
    pub approx_sum: f64,
}

/// Everything the caller needs to render an answer.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub sql: String,
    pub explanation: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub metrics: QueryMetrics,
}

/// Orchestrates the stores, codec, executor and generator. All collaborators
/// are injected so tests can swap in mocks.
pub struct QueryPipeline {
    store: Arc<ConnectionStore>,
    codec: SecretCodec,
    executor: Arc<dyn DatabaseExecutor>,
    generator: SqlGenerator,
}

impl QueryPipeline {
    pub fn new(
        store: Arc<ConnectionStore>,
        codec: SecretCodec,
        executor: Arc<dyn DatabaseExecutor>,
        generator: SqlGenerator,
    ) -> Self {
        Self {
            store,
            codec,
            executor,
            generator,
        }
    }

    /// Runs one request through every stage.
    pub async fn run(&self, request: &QueryRequest) -> Result<QueryResponse> {
        if request.connection_id.trim().is_empty() {
            return Err(QuerionError::validation("connection id is required"));
        }
        if request.prompt.trim().is_empty() {
            return Err(QuerionError::validation("prompt is required"));
        }

        let record = self
            .store
            .find_by_id(&request.connection_id)
            .await?
            .ok_or_else(|| {
                QuerionError::not_found(format!(
                    "Connection not found: {}",
                    request.connection_id
                ))
            })?;

        let params = ConnectionParams {
            host: record.host,
            port: record.port,
            database: record.database,
            user: record.username,
            password: self.codec.decrypt(&record.password),
        };

        let schema = self.executor.fetch_schema(&params).await;
        if schema.is_unusable() {
            warn!("Schema summary unusable: {}", schema.render());
        }

        let generated = self.generator.generate(&schema, &request.prompt).await?;
        // A blank sql string counts as "no query", same as a missing one.
        let sql = match generated.sql {
            Some(sql) if !sql.trim().is_empty() => sql,
            _ => return Err(QuerionError::generation(generated.explanation)),
        };

        info!("Executing generated SQL: {sql}");
        let result = self.executor.run_read_only(&params, &sql).await?;
        let metrics = compute_metrics(&result);

        Ok(QueryResponse {
            sql,
            explanation: generated.explanation,
            columns: result.columns,
            rows: result.rows,
            metrics,
        })
    }
}

/// Computes row count and the naive column sum.
///
/// The summed column is picked from the first row only: the first value
/// with a numeric type. Non-numeric values of that column in later rows
/// contribute nothing.
pub fn compute_metrics(result: &QueryResult) -> QueryMetrics {
    let total_rows = result.rows.len();

    let numeric_index = result
        .rows
        .first()
        .and_then(|row| row.iter().position(|value| value.as_numeric().is_some()));

    let approx_sum = match numeric_index {
        Some(index) => result
            .rows
            .iter()
            .filter_map(|row| row.get(index).and_then(|value| value.as_numeric()))
            .sum(),
        None => 0.0,
    };

    QueryMetrics {
        total_rows,
        approx_sum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;

    fn result_with(rows: Vec<Row>) -> QueryResult {
        QueryResult {
            columns: vec!["a".to_string(), "b".to_string()],
            rows,
        }
    }

    #[test]
    fn test_metrics_sum_first_numeric_column() {
        let result = result_with(vec![
            vec![Value::Int(1), Value::String("x".to_string())],
            vec![Value::Int(2), Value::String("y".to_string())],
        ]);

        let metrics = compute_metrics(&result);
        assert_eq!(metrics.total_rows, 2);
        assert_eq!(metrics.approx_sum, 3.0);
    }

    #[test]
    fn test_metrics_skip_leading_text_column() {
        let result = result_with(vec![
            vec![Value::String("widgets".to_string()), Value::Float(9.5)],
            vec![Value::String("gears".to_string()), Value::Float(0.5)],
        ]);

        let metrics = compute_metrics(&result);
        assert_eq!(metrics.approx_sum, 10.0);
    }

    #[test]
    fn test_metrics_no_numeric_column() {
        let result = result_with(vec![vec![
            Value::String("only".to_string()),
            Value::Null,
        ]]);

        let metrics = compute_metrics(&result);
        assert_eq!(metrics.total_rows, 1);
        assert_eq!(metrics.approx_sum, 0.0);
    }

    #[test]
    fn test_metrics_empty_result() {
        let metrics = compute_metrics(&result_with(vec![]));
        assert_eq!(metrics.total_rows, 0);
        assert_eq!(metrics.approx_sum, 0.0);
    }

    #[test]
    fn test_metrics_column_choice_fixed_by_first_row() {
        // The second row's first column is numeric, but the pick happens on
        // the first row, where only column b qualifies.
        let result = result_with(vec![
            vec![Value::String("n/a".to_string()), Value::Int(10)],
            vec![Value::Int(100), Value::Int(5)],
        ]);

        let metrics = compute_metrics(&result);
        assert_eq!(metrics.approx_sum, 15.0);
    }
}
