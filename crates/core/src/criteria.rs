//! Buyer search criteria.
//!
//! Every bound is optional. A set bound only matches a numeric field; text
//! left over from ingest (e.g. an empty LOT SIZE cell) never satisfies it.

use crate::{FieldValue, Listing, Property};
use serde::{Deserialize, Serialize};

/// Minimums on the physical property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyCriteria {
    #[serde(default)]
    pub min_beds: Option<f64>,
    #[serde(default)]
    pub min_baths: Option<f64>,
    #[serde(default)]
    pub min_sq_ft: Option<f64>,
    #[serde(default)]
    pub min_parking: Option<f64>,
    #[serde(default)]
    pub min_lot_size: Option<f64>,
}

/// Maximums and status filter on the market offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingCriteria {
    #[serde(default)]
    pub max_list_price: Option<f64>,
    /// Requires an available estimate when set.
    #[serde(default)]
    pub max_valuation: Option<f64>,
    #[serde(default)]
    pub max_days_on_market: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Full buyer criteria.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(default)]
    pub property: PropertyCriteria,
    #[serde(default)]
    pub listing: ListingCriteria,
}

fn at_least(value: &FieldValue, bound: Option<f64>) -> bool {
    match bound {
        None => true,
        Some(min) => value.as_f64().is_some_and(|v| v >= min),
    }
}

fn at_most(value: &FieldValue, bound: Option<f64>) -> bool {
    match bound {
        None => true,
        Some(max) => value.as_f64().is_some_and(|v| v <= max),
    }
}

impl ListingCriteria {
    /// The same criteria with the valuation bound removed.
    ///
    /// Used to pick enrichment candidates before any valuation is known.
    pub fn without_valuation(&self) -> Self {
        Self { max_valuation: None, ..self.clone() }
    }
}

impl SearchCriteria {
    pub fn matches(&self, listing: &Listing) -> bool {
        listing.property.matches_search(&self.property) && listing.matches_search(&self.listing)
    }

    /// Whether the listing can still match once a valuation is known.
    pub fn is_candidate(&self, listing: &Listing) -> bool {
        listing.property.matches_search(&self.property) && listing.matches_search(&self.listing.without_valuation())
    }
}

impl Property {
    pub fn matches_search(&self, criteria: &PropertyCriteria) -> bool {
        at_least(&self.beds, criteria.min_beds)
            && at_least(&self.baths, criteria.min_baths)
            && at_least(&self.sq_ft, criteria.min_sq_ft)
            && at_least(&self.parking, criteria.min_parking)
            && at_least(&self.lot_size, criteria.min_lot_size)
    }
}

impl Listing {
    pub fn matches_search(&self, criteria: &ListingCriteria) -> bool {
        let valuation_ok = match criteria.max_valuation {
            None => true,
            Some(max) => self
                .valuation
                .and_then(|v| v.amount())
                .is_some_and(|amount| amount as f64 <= max),
        };
        let status_ok = criteria.status.as_deref().is_none_or(|status| self.status == status);

        at_most(&self.list_price, criteria.max_list_price)
            && valuation_ok
            && at_most(&self.days_on_market, criteria.max_days_on_market)
            && status_ok
    }
}
