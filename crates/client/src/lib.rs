//! Client code for househunt.
//!
//! This crate provides the bulk listing source client, the valuation
//! provider, and the enrichment pipeline that ties the provider to the
//! valuation cache.

pub mod enrich;
pub mod listings;
pub mod valuation;

pub use enrich::{EnrichError, EnrichOutcome, EnrichStats, Enricher};
pub use listings::{ListingClient, ListingConfig, RegionQuery, parse_listings_csv};
pub use valuation::{SearchResults, ValuationClient, ValuationConfig, ValuationError, ValuationProvider, reduce};
