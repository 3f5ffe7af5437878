//! househunt entry point.
//!
//! Results go to stdout; logging goes to stderr as JSON so the two never mix.

use anyhow::Result;
use clap::{Parser, Subcommand};
use househunt_client::listings::RegionId;
use househunt_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod cache;
mod render;
mod search;

use render::Format;

#[derive(Parser)]
#[command(name = "househunt")]
#[command(about = "Find listings that match buyer criteria, with cached valuations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch listings, filter them, and print the matches
    Search {
        /// Region to search (repeatable; replaces the configured regions)
        #[arg(long = "region", value_name = "ID")]
        regions: Vec<RegionId>,

        /// Look up valuations for candidate listings
        #[arg(long)]
        enrich: bool,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Print the export URL for each region
    Urls {
        #[arg(long = "region", value_name = "ID")]
        regions: Vec<RegionId>,
    },

    /// Inspect or maintain the valuation cache
    Cache {
        #[command(subcommand)]
        command: cache::CacheCommand,
    },
}

/// Flag values replace configured ones only when given.
fn apply_overrides(config: &mut AppConfig, regions: Vec<RegionId>, enrich: bool) {
    if !regions.is_empty() {
        config.regions = regions;
    }
    if enrich {
        config.enrich = true;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load()?;

    match cli.command {
        Commands::Search { regions, enrich, format } => {
            apply_overrides(&mut config, regions, enrich);
            let matches = search::run(&config).await?;
            println!("{}", render::render(&matches, format)?);
            search::notify_matches(&matches);
        }
        Commands::Urls { regions } => {
            apply_overrides(&mut config, regions, false);
            for url in search::region_urls(&config)? {
                println!("{url}");
            }
        }
        Commands::Cache { command } => {
            let output = cache::run(&config, command).await?;
            println!("{output}");
        }
    }

    Ok(())
}
