//! querion - ask your MySQL database questions in plain language.

use querion::cli::{AskArgs, Cli, Command, ConnectionCommand};
use querion::config::Config;
use querion::db::{ConnectionParams, DatabaseExecutor, MySqlExecutor};
use querion::error::{QuerionError, Result};
use querion::llm::{OpenRouterClient, SqlGenerator};
use querion::pipeline::{QueryPipeline, QueryRequest, QueryResponse};
use querion::secrets::SecretCodec;
use querion::store::{ConnectionStore, NewConnection};
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Log to stderr so stdout stays clean for results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!("{}: {e}", e.kind());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Connection(command) => run_connection(command, &config).await,
        Command::Ask(args) => run_ask(args, &config).await,
    }
}

async fn run_connection(command: ConnectionCommand, config: &Config) -> Result<()> {
    let store = ConnectionStore::open(&config.store_path).await?;
    let codec = SecretCodec::new(config.encryption_key.clone());

    match command {
        ConnectionCommand::Add(args) => {
            let input = args.resolve()?;
            let record = store
                .create(NewConnection {
                    name: input.name,
                    host: input.host,
                    port: input.port,
                    database: input.database,
                    username: input.username,
                    password: codec.encrypt(&input.password),
                })
                .await?;
            println!("Saved connection '{}' with id {}", record.name, record.id);
        }
        ConnectionCommand::List => {
            let connections = store.list().await?;
            if connections.is_empty() {
                println!("No saved connections. Add one with `querion connection add`.");
            }
            for conn in &connections {
                println!(
                    "{}  {}  {}@{}:{}/{}  {}",
                    conn.id,
                    conn.name,
                    conn.username,
                    conn.host,
                    conn.port,
                    conn.database,
                    conn.created_at
                );
            }
        }
        ConnectionCommand::Test { id } => {
            let record = store
                .find_by_id(&id)
                .await?
                .ok_or_else(|| QuerionError::not_found(format!("Connection not found: {id}")))?;
            let params = ConnectionParams {
                host: record.host,
                port: record.port,
                database: record.database,
                user: record.username,
                password: codec.decrypt(&record.password),
            };
            MySqlExecutor::new().probe(&params).await?;
            println!("Connection '{}' is reachable.", record.name);
        }
    }

    store.close().await;
    Ok(())
}

async fn run_ask(args: AskArgs, config: &Config) -> Result<()> {
    let store = Arc::new(ConnectionStore::open(&config.store_path).await?);
    let codec = SecretCodec::new(config.encryption_key.clone());

    let api_key = config.llm.usable_api_key();
    let client = OpenRouterClient::new(api_key.unwrap_or_default(), config.llm.base_url.clone())?;
    let generator = SqlGenerator::new(
        Box::new(client),
        config.llm.model.clone(),
        api_key.is_some(),
    );

    let pipeline = QueryPipeline::new(
        store.clone(),
        codec,
        Arc::new(MySqlExecutor::new()),
        generator,
    );

    let request = QueryRequest {
        connection_id: args.connection,
        prompt: args.prompt,
    };
    let response = pipeline.run(&request).await?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&response)
            .map_err(|e| QuerionError::execution(format!("Failed to render JSON: {e}")))?;
        println!("{rendered}");
    } else {
        print_response(&response);
    }

    store.close().await;
    Ok(())
}

fn print_response(response: &QueryResponse) {
    println!("SQL: {}", response.sql);
    println!("Explanation: {}", response.explanation);
    println!();

    if response.columns.is_empty() && response.rows.is_empty() {
        println!("(no results)");
    } else {
        println!("{}", response.columns.join("\t"));
        for row in &response.rows {
            let cells: Vec<String> = row.iter().map(|v| v.to_display_string()).collect();
            println!("{}", cells.join("\t"));
        }
    }

    println!();
    println!(
        "{} rows, approximate sum {}",
        response.metrics.total_rows, response.metrics.approx_sum
    );
}
