//! querywarden CLI
//!
//! Answers one natural-language question against the configured database,
//! guarded by the SQL safety validator and the retry/fallback workflow.

use anyhow::Context;
use clap::Parser;
use querywarden::config::{LlmConfig, WorkflowConfig};
use querywarden::db::PgExecutionEngine;
use querywarden::llm::LlmClient;
use querywarden::schema::SchemaInfo;
use querywarden::workflow::runner::WorkflowRunner;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "querywarden",
    about = "Validated natural-language querying over Postgres"
)]
struct Cli {
    /// Natural-language question to answer
    question: String,

    /// Path to the pre-generated schema metadata
    #[arg(long, default_value = "config/schema_info.json")]
    schema: PathBuf,

    /// Postgres connection string; falls back to DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// SQL generation attempts before the fallback strategy kicks in
    #[arg(long, default_value_t = 3)]
    max_retries: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let schema = SchemaInfo::load(&cli.schema)?;
    let allowed = schema.allowed_tables();

    let llm_config = LlmConfig::from_env()?;
    let generator = Arc::new(LlmClient::from_config(&llm_config));

    let database_url = cli
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .context("DATABASE_URL is not set")?;
    let engine = Arc::new(PgExecutionEngine::connect(&database_url).await?);

    let config = WorkflowConfig {
        max_retries: cli.max_retries,
        ..WorkflowConfig::default()
    };
    let runner = WorkflowRunner::new(
        generator,
        engine,
        allowed,
        schema.llm_prompt.clone(),
        config,
    );

    let report = runner.answer(&cli.question).await?;

    println!("{}", report.answer);
    if report.succeeded {
        if let Some(sql) = &report.sql {
            println!("\nquery: {}", sql);
        }
        if let Some(rows) = &report.rows_json {
            println!("rows: {}", rows);
        }
    }
    std::process::exit(if report.succeeded { 0 } else { 1 });
}
