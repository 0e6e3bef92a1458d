//! Script mode binary for one-off domain searches
//!
//! Warms up a session, runs one search, and prints the results to stdout as
//! JSON.
//!
//! # Usage
//!
//! ```bash
//! instant-domains-search dealerflow --tlds com,io,dev
//! ```
//!
//! # Output
//!
//! ```json
//! {
//!   "query": "dealerflow",
//!   "main_results": [{"domain": "dealerflow.com", "is_available": false}],
//!   "suggested_results": []
//! }
//! ```

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use instant_domains::{InstantDomainsClient, api::domain_search, config::ConfigLoader};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "instant-domains-search")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Name to search for (label only; a TLD suffix is ignored)
    #[arg(value_name = "QUERY")]
    query: Option<String>,

    /// Comma-separated TLD list (defaults to the common set)
    #[arg(short, long, value_name = "TLDS")]
    tlds: Option<String>,

    /// Skip fetching and checking suggested alternative names
    #[arg(long)]
    no_suggestions: bool,

    /// Configuration file path (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Show version information
    #[arg(long)]
    version: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle version flag early
    if cli.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Logging goes to stderr so stdout stays valid JSON
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(query) = cli.query else {
        eprintln!("A query is required; see --help");
        std::process::exit(2);
    };

    let settings = ConfigLoader::new().load(cli.config.as_deref())?;
    let client = InstantDomainsClient::with_settings(settings)?;

    let tlds = match &cli.tlds {
        Some(list) => list
            .split(',')
            .map(|tld| tld.trim().trim_start_matches('.').to_string())
            .filter(|tld| !tld.is_empty())
            .collect(),
        None => domain_search::default_tlds(),
    };

    debug!(query = %query, tlds = tlds.len(), "starting search");

    client.warmup().await?;
    match client
        .domain_search()
        .search(&query, &tlds, !cli.no_suggestions)
        .await
    {
        Ok(results) => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Err(e) => {
            eprintln!("Search failed: {}", e);
            std::process::exit(1);
        }
    }

    client.close();
    Ok(())
}
