//! Scriptable executor for tests. Returns canned schema summaries and query
//! results without touching a real server, while still enforcing the
//! read-only gate so test flows exercise the same rejection path.

use crate::db::{ConnectionParams, DatabaseExecutor, QueryResult, SchemaSummary};
use crate::error::{QuerionError, Result};
use crate::safety;
use async_trait::async_trait;
use std::sync::Mutex;

pub struct MockExecutor {
    schema: SchemaSummary,
    results: Mutex<Vec<Result<QueryResult>>>,
    executed: Mutex<Vec<String>>,
    probe_error: Option<String>,
}

impl MockExecutor {
    pub fn new(schema: SchemaSummary) -> Self {
        Self {
            schema,
            results: Mutex::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
            probe_error: None,
        }
    }

    /// Queues a result; queued results are consumed in FIFO order.
    pub fn push_result(&self, result: Result<QueryResult>) {
        self.results.lock().unwrap().push(result);
    }

    pub fn with_probe_error(mut self, message: impl Into<String>) -> Self {
        self.probe_error = Some(message.into());
        self
    }

    /// Statements that made it past the read-only gate.
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatabaseExecutor for MockExecutor {
    async fn fetch_schema(&self, _params: &ConnectionParams) -> SchemaSummary {
        self.schema.clone()
    }

    async fn run_read_only(&self, _params: &ConnectionParams, sql: &str) -> Result<QueryResult> {
        safety::ensure_read_only(sql)?;
        self.executed.lock().unwrap().push(sql.to_string());

        let mut results = self.results.lock().unwrap();
        if results.is_empty() {
            return Ok(QueryResult::default());
        }
        results.remove(0)
    }

    async fn probe(&self, _params: &ConnectionParams) -> Result<()> {
        match &self.probe_error {
            Some(message) => Err(QuerionError::connection(message.clone())),
            None => Ok(()),
        }
    }
}
