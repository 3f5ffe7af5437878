//! SQLite-backed valuation cache.
//!
//! This module provides a persistent cache of property valuations keyed by
//! content-derived listing identity, using SQLite with async access via
//! tokio-rusqlite. It supports:
//!
//! - Identity derivation from a property's canonical address (MD5, hex)
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Time-based eviction with a fixed 12 hour TTL

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod valuations;

use std::time::Duration;

pub use crate::Error;

pub use connection::CacheDb;
pub use valuations::ValuationRecord;

/// Age after which a cached valuation is swept.
pub const VALUATION_TTL: Duration = Duration::from_secs(12 * 60 * 60);
