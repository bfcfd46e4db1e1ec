//! Aluminum CLI
//!
//! Command-line access to a store:
//! - Check health
//! - List bucket descriptions
//! - Run raw pipeline queries
//! - Delete buckets
//! - Generate a config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use aluminum::config::{generate_default_config, Config};
use aluminum::transport::{HttpTransport, Transport};
use aluminum::{logging, Engine, Store};

#[derive(Parser)]
#[command(name = "aluminum")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Typed buckets and queries for InfluxDB-style time-series stores")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Store URL
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// API token
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Organization ID
    #[arg(long, global = true)]
    pub org: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the store is reachable and accepts the credentials
    Health,

    /// List bucket descriptions
    Buckets,

    /// Run a raw pipeline query and print the rows as JSON
    Query {
        /// Bucket name
        bucket: String,
        /// Query text, e.g. 'from(bucket: "cpu") |> range(start: -1h)'
        query: String,
    },

    /// Delete a bucket
    Delete {
        /// Bucket name
        bucket: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Config written to {}", path.display());
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(host) = &cli.host {
        config.connection.host = host.clone();
    }
    if let Some(token) = &cli.token {
        config.connection.token = token.clone();
    }
    if let Some(org) = &cli.org {
        config.connection.org_id = org.clone();
    }

    logging::init(&config.logging)?;

    let engine = Engine::from_config(&config.connection);
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&engine)?);
    let store = Store::with_transport(engine, transport);

    match cli.command {
        Commands::Health => {
            if store.healthy().await? {
                println!("Store at {} is healthy", store.engine().host);
            } else {
                eprintln!("Store at {} reports unhealthy", store.engine().host);
                std::process::exit(1);
            }
        }

        Commands::Buckets => {
            let buckets = store.get_buckets().await?;
            println!("{}", serde_json::to_string_pretty(&buckets)?);
        }

        Commands::Query { bucket, query } => {
            let output = store.transport().query_raw(&bucket, &query).await?;
            println!("{}", serde_json::to_string_pretty(&output.rows)?);
            tracing::info!(bucket = %output.name, rows = output.rows.len(), "Query complete");
        }

        Commands::Delete { bucket } => {
            if store.transport().delete_bucket(&bucket).await? {
                println!("Deleted bucket {}", bucket);
            } else {
                println!("Bucket {} does not exist", bucket);
            }
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}
