use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ledger_vectordb_core::EmbeddingPrecision;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "ledger-vectordb")]
#[command(about = "Per-tenant vector similarity store for ledger chains", long_about = None)]
struct Cli {
    /// SQLite database file (overrides VECTORDB_SQLITE_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// PostgreSQL URL (overrides VECTORDB_DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,
    /// Chain whose vector table is used (overrides VECTORDB_CHAIN_IID)
    #[arg(long, global = true)]
    chain_iid: Option<u64>,
    /// Embedding dimensionality of the chain
    #[arg(short, long, global = true, default_value = "3")]
    dimensions: usize,
    #[arg(long, global = true, default_value = "half")]
    precision: EmbeddingPrecision,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vector table and indexes
    Init,
    /// Store one vector
    Store {
        #[arg(short, long)]
        context: i64,
        #[arg(short, long)]
        id: i64,
        /// Vector literal, e.g. "[1,2,3]"
        #[arg(short, long)]
        vector: String,
    },
    /// Delete every vector stored under (context, id)
    Delete {
        #[arg(short, long)]
        context: i64,
        #[arg(short, long)]
        id: i64,
    },
    /// Apply a JSON array of {"type", "data"} events as one block
    Apply { events: PathBuf },
    /// Nearest neighbors of a query vector
    Query {
        #[arg(short, long)]
        context: i64,
        #[arg(short, long)]
        vector: String,
        #[arg(short = 'm', long)]
        max_distance: String,
        #[arg(short = 'n', long)]
        max_vectors: Option<i64>,
    },
    /// Count stored vectors in a context
    Count {
        #[arg(short, long)]
        context: i64,
        #[arg(short, long)]
        id: Option<i64>,
    },
}

fn get_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ledger-vectordb")
        .join("vectors.db")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let target = commands::Target {
        db: cli.db,
        database_url: cli.database_url,
        chain_iid: cli.chain_iid,
        dimensions: cli.dimensions,
        precision: cli.precision,
    };

    match cli.command {
        Commands::Init => commands::init::run_init(&target).await?,
        Commands::Store { context, id, vector } => {
            commands::mutate::run_store(&target, context, id, vector).await?;
        },
        Commands::Delete { context, id } => commands::mutate::run_delete(&target, context, id).await?,
        Commands::Apply { events } => commands::mutate::run_apply(&target, &events).await?,
        Commands::Query { context, vector, max_distance, max_vectors } => {
            commands::query::run_query(&target, context, vector, max_distance, max_vectors).await?;
        },
        Commands::Count { context, id } => commands::query::run_count(&target, context, id).await?,
    }

    Ok(())
}
