//! Taxograph CLI - Command line interface for the class hierarchy builder

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use commands::{build, classify, map, reduce};
use taxograph_core::BuildConfig;
use taxograph_oracle::{SparqlClient, WIKIDATA_ENDPOINT, WIKIDATA_ENTITY_PREFIX};

#[derive(Parser)]
#[command(name = "taxograph")]
#[command(author, version, about = "Build a single-rooted class hierarchy from classified objects")]
pub struct Cli {
    /// Object classification input (JSON)
    #[arg(short, long, default_value = "objects.json", global = true)]
    pub objects: PathBuf,

    /// Hierarchy edge list (CSV)
    #[arg(short, long, default_value = "graph_arcs.csv", global = true)]
    pub graph: PathBuf,

    /// SPARQL endpoint URL
    #[arg(short, long, default_value = WIKIDATA_ENDPOINT, global = true)]
    pub endpoint: String,

    /// Root class identifier
    #[arg(short, long, default_value = "Q729", global = true)]
    pub root: String,

    /// Entity URI prefix stripped from oracle results
    #[arg(long, default_value = WIKIDATA_ENTITY_PREFIX, global = true)]
    pub entity_prefix: String,

    /// Chunk size for batched VALUES selects
    #[arg(long, default_value = "400", global = true)]
    pub batch_size: usize,

    /// Depth bound for recursive parent resolution
    #[arg(long, default_value = "32", global = true)]
    pub max_depth: u32,

    /// Output format: text, json
    #[arg(short, long, default_value = "text", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config(&self) -> BuildConfig {
        BuildConfig::default()
            .with_root(self.root.as_str())
            .with_entity_uri_prefix(self.entity_prefix.as_str())
            .with_batch_size(self.batch_size)
            .with_max_depth(self.max_depth)
    }

    pub fn client(&self) -> SparqlClient {
        SparqlClient::new(&self.endpoint)
            .with_entity_prefix(self.entity_prefix.as_str())
            .with_batch_size(self.batch_size)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assign a classification pattern to each object
    Classify(classify::ClassifyArgs),
    /// Resolve pattern-specific path evidence for classified objects
    Map(map::MapArgs),
    /// Construct hierarchy edges from the classified objects
    Build(build::BuildArgs),
    /// Remove redundant multi-hop edges from the hierarchy
    Reduce(reduce::ReduceArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting taxograph CLI");

    match &cli.command {
        Commands::Classify(args) => classify::run(args, &cli).await?,
        Commands::Map(args) => map::run(args, &cli).await?,
        Commands::Build(args) => build::run(args, &cli).await?,
        Commands::Reduce(args) => reduce::run(args, &cli).await?,
    }

    Ok(())
}
