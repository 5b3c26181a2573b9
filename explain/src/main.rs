use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use search_explain::query::{match_all_query, query_string_query, raw_query};
use search_explain::utils::{ExplainErrorResponse, init_logging};
use search_explain::{Config, ExplainRequestBuilder, ExplainResponse, SearchClient};

/// Explain how one document scores against a query
#[derive(Debug, Parser)]
#[command(name = "search-explain", version, about)]
struct Cli {
    /// Index holding the document
    index: String,
    /// Document type
    doc_type: String,
    /// Document id
    id: String,

    /// Path to config.toml (default: conf/config.toml or ./config.toml)
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    routing: Option<String>,

    /// Parent document id, used for routing
    #[arg(long)]
    parent: Option<String>,

    /// Shard preference, e.g. _local or _primary
    #[arg(long)]
    preference: Option<String>,

    /// Query as JSON, e.g. '{"term":{"user":"kimchy"}}'
    #[arg(long, conflicts_with_all = ["query_string", "match_all"])]
    query: Option<String>,

    /// Query in query_string syntax
    #[arg(long, conflicts_with = "match_all")]
    query_string: Option<String>,

    #[arg(long)]
    match_all: bool,

    /// File with a complete explain body; ignored when a query option is given
    #[arg(long)]
    source_file: Option<String>,

    /// Run the explain off the calling thread when served locally
    #[arg(long)]
    threaded: bool,

    /// Print the raw JSON response instead of the explanation tree
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let _guard = init_logging(&config.logging)?;

    let client = Arc::new(SearchClient::new(config.cluster.clone()));
    let mut builder = client
        .prepare_explain(&cli.index, &cli.doc_type, &cli.id)
        .operation_threaded(cli.threaded);

    if let Some(routing) = &cli.routing {
        builder = builder.set_routing(routing);
    }
    if let Some(parent) = &cli.parent {
        builder = builder.set_parent(parent);
    }
    if let Some(preference) = &cli.preference {
        builder = builder.set_preference(preference);
    }
    builder = apply_payload(builder, &cli)?;

    match builder.execute().await {
        Ok(response) => {
            print_response(&response, cli.json)?;
            Ok(())
        },
        Err(e) => {
            tracing::error!("Explain failed: {}", e);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&ExplainErrorResponse::from(&e))?);
            }
            anyhow::bail!("[{}] {}", e.error_code(), e)
        },
    }
}

fn apply_payload(
    mut builder: ExplainRequestBuilder,
    cli: &Cli,
) -> anyhow::Result<ExplainRequestBuilder> {
    if let Some(path) = &cli.source_file {
        let bytes = std::fs::read(path)?;
        // The buffer is handed over and never touched again
        builder = builder.set_source(bytes, true);
    }

    if let Some(query) = &cli.query {
        let value: serde_json::Value = serde_json::from_str(query)
            .map_err(|e| anyhow::anyhow!("--query is not valid JSON: {}", e))?;
        builder = builder.set_query(raw_query(value));
    } else if let Some(text) = &cli.query_string {
        builder = builder.set_query(query_string_query(text));
    } else if cli.match_all {
        builder = builder.set_query(match_all_query());
    }

    Ok(builder)
}

fn print_response(response: &ExplainResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    println!(
        "[{}][{}][{}] matched: {}",
        response.index, response.doc_type, response.id, response.matched
    );
    if let Some(explanation) = &response.explanation {
        print!("{}", explanation.to_tree_string());
    }
    Ok(())
}
