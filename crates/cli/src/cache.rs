//! Valuation cache maintenance commands.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use househunt_core::cache::hash::is_identity;
use househunt_core::{AppConfig, CacheDb, Error};

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Print the record stored for an identity
    Get { identity: String },

    /// Delete the record stored for an identity
    Remove { identity: String },

    /// Delete every record older than the cache TTL
    Sweep,

    /// Print every record, newest first
    List,
}

pub async fn run(config: &AppConfig, command: CacheCommand) -> Result<String> {
    let cache = CacheDb::open(&config.db_path).await?;
    execute(&cache, command, Utc::now()).await
}

fn check_identity(identity: &str) -> Result<(), Error> {
    if is_identity(identity) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("{identity:?} is not an identity (expected 32 lowercase hex characters)")))
    }
}

pub(crate) async fn execute(cache: &CacheDb, command: CacheCommand, now: DateTime<Utc>) -> Result<String> {
    let output = match command {
        CacheCommand::Get { identity } => {
            check_identity(&identity)?;
            let record = cache
                .get_valuation(&identity)
                .await?
                .ok_or_else(|| Error::CacheMiss(identity.clone()))?;
            serde_json::to_string_pretty(&record)?
        }
        CacheCommand::Remove { identity } => {
            check_identity(&identity)?;
            if cache.remove_valuation(&identity).await? {
                format!("removed {identity}")
            } else {
                format!("no record for {identity}")
            }
        }
        CacheCommand::Sweep => {
            let removed = cache.sweep_valuations(now).await?;
            tracing::info!(removed, "cache sweep finished");
            format!("removed {removed} expired records")
        }
        CacheCommand::List => serde_json::to_string_pretty(&cache.list_valuations().await?)?,
    };
    Ok(output)
}
