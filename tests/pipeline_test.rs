//! End-to-end pipeline tests over mock collaborators.
//!
//! Uses the in-memory connection store, the scripted completion client, and
//! the mock executor; no real MySQL or completion API is involved.

use querion::db::{MockExecutor, QueryResult, SchemaSummary, Value};
use querion::llm::{CompletionClient, Message, MockCompletionClient, SqlGenerator};
use querion::pipeline::{QueryPipeline, QueryRequest};
use querion::secrets::SecretCodec;
use querion::store::{ConnectionStore, NewConnection};
use std::sync::Arc;

const KEY: &str = "test-encryption-key";

struct SharedClient(Arc<MockCompletionClient>);

#[async_trait::async_trait]
impl CompletionClient for SharedClient {
    async fn complete(&self, model: &str, messages: &[Message]) -> querion::error::Result<String> {
        self.0.complete(model, messages).await
    }
}

struct Harness {
    pipeline: QueryPipeline,
    executor: Arc<MockExecutor>,
    client: Arc<MockCompletionClient>,
    connection_id: String,
}

async fn harness(schema: SchemaSummary) -> Harness {
    let store = Arc::new(ConnectionStore::open_in_memory().await.unwrap());
    let codec = SecretCodec::new(KEY);

    let record = store
        .create(NewConnection {
            name: Some("Test DB".to_string()),
            host: "db.internal".to_string(),
            port: 3306,
            database: "shop".to_string(),
            username: "reader".to_string(),
            password: codec.encrypt("s3cret"),
        })
        .await
        .unwrap();

    let executor = Arc::new(MockExecutor::new(schema));
    let client = Arc::new(MockCompletionClient::new());
    let generator = SqlGenerator::new(Box::new(SharedClient(client.clone())), None, true);

    let pipeline = QueryPipeline::new(store, SecretCodec::new(KEY), executor.clone(), generator);

    Harness {
        pipeline,
        executor,
        client,
        connection_id: record.id,
    }
}

fn usable_schema() -> SchemaSummary {
    SchemaSummary::Tables(
        "DATABASE SCHEMA:\nTotal Tables Found: 1\nAll Table Names: users".to_string(),
    )
}

#[tokio::test]
async fn happy_path_returns_rows_and_metrics() {
    let h = harness(usable_schema()).await;
    h.client.push_content(
        r#"{"sql": "SELECT id, name FROM users", "explanation": "All users with ids."}"#,
    );
    h.executor.push_result(Ok(QueryResult {
        columns: vec!["id".to_string(), "name".to_string()],
        rows: vec![
            vec![Value::Int(1), Value::String("ada".to_string())],
            vec![Value::Int(2), Value::String("grace".to_string())],
        ],
    }));

    let response = h
        .pipeline
        .run(&QueryRequest {
            connection_id: h.connection_id.clone(),
            prompt: "list all users".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.sql, "SELECT id, name FROM users");
    assert_eq!(response.explanation, "All users with ids.");
    assert_eq!(response.columns, vec!["id", "name"]);
    assert_eq!(response.metrics.total_rows, 2);
    assert_eq!(response.metrics.approx_sum, 3.0);
    assert_eq!(h.executor.executed_sql(), vec!["SELECT id, name FROM users"]);
}

#[tokio::test]
async fn empty_schema_is_a_client_error_without_model_calls() {
    let h = harness(SchemaSummary::Empty).await;

    let err = h
        .pipeline
        .run(&QueryRequest {
            connection_id: h.connection_id.clone(),
            prompt: "count users".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "generation");
    assert!(err.is_client_error());
    assert!(err.to_string().contains("empty"));
    assert!(h.client.models_tried().is_empty());
    assert!(h.executor.executed_sql().is_empty());
}

#[tokio::test]
async fn destructive_sql_from_model_is_blocked_before_execution() {
    let h = harness(usable_schema()).await;
    h.client
        .push_content(r#"{"sql": "DROP TABLE users", "explanation": "oops"}"#);

    let err = h
        .pipeline
        .run(&QueryRequest {
            connection_id: h.connection_id.clone(),
            prompt: "remove the users table".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "security");
    assert!(h.executor.executed_sql().is_empty());
}

#[tokio::test]
async fn unknown_connection_is_not_found() {
    let h = harness(usable_schema()).await;

    let err = h
        .pipeline
        .run(&QueryRequest {
            connection_id: "no-such-id".to_string(),
            prompt: "anything".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "not-found");
    assert!(h.client.models_tried().is_empty());
}

#[tokio::test]
async fn blank_prompt_is_a_validation_error() {
    let h = harness(usable_schema()).await;

    let err = h
        .pipeline
        .run(&QueryRequest {
            connection_id: h.connection_id.clone(),
            prompt: "   ".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn model_fallback_recovers_from_a_bad_first_model() {
    let h = harness(usable_schema()).await;
    h.client.push_error("model offline");
    h.client
        .push_content(r#"{"sql": "SELECT COUNT(*) FROM users", "explanation": "Counts users."}"#);
    h.executor.push_result(Ok(QueryResult {
        columns: vec!["COUNT(*)".to_string()],
        rows: vec![vec![Value::Int(42)]],
    }));

    let response = h
        .pipeline
        .run(&QueryRequest {
            connection_id: h.connection_id.clone(),
            prompt: "how many users?".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(h.client.models_tried().len(), 2);
    assert_eq!(response.metrics.total_rows, 1);
    assert_eq!(response.metrics.approx_sum, 42.0);
}

#[tokio::test]
async fn blank_sql_from_model_is_a_client_error() {
    let h = harness(usable_schema()).await;
    h.client
        .push_content(r#"{"sql": "", "explanation": "I could not form a query."}"#);

    let err = h
        .pipeline
        .run(&QueryRequest {
            connection_id: h.connection_id.clone(),
            prompt: "something unanswerable".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "generation");
    assert!(err.is_client_error());
    assert!(err.to_string().contains("could not form a query"));
    assert!(h.executor.executed_sql().is_empty());
}

#[tokio::test]
async fn model_refusal_surfaces_its_explanation() {
    let h = harness(usable_schema()).await;
    h.client.push_content(
        r#"{"explanation": "The schema has no table related to invoices."}"#,
    );

    let err = h
        .pipeline
        .run(&QueryRequest {
            connection_id: h.connection_id.clone(),
            prompt: "total invoice amount".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "generation");
    assert!(err.to_string().contains("no table related to invoices"));
    assert!(h.executor.executed_sql().is_empty());
}
