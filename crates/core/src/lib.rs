//! Core types and shared functionality for househunt.
//!
//! This crate provides:
//! - Listing and property data model with parse-on-ingest field classification
//! - Content-derived listing identity
//! - Valuation cache with SQLite backend and TTL sweep
//! - Buyer search criteria
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod criteria;
pub mod error;
pub mod listing;

pub use cache::{CacheDb, VALUATION_TTL, ValuationRecord};
pub use config::AppConfig;
pub use criteria::{ListingCriteria, PropertyCriteria, SearchCriteria};
pub use error::Error;
pub use listing::{FieldValue, Listing, OpenHouse, Property, Valuation};
