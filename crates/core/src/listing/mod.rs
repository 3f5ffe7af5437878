//! Listing data model.
//!
//! A [`Listing`] exclusively owns its [`Property`]; its cache identity is the
//! property's identity, so price, status and valuation never take part in it.

mod field;
mod property;

pub use field::FieldValue;
pub use property::Property;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single market-value estimate, or a computed "no estimate".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum Valuation {
    Estimate(i64),
    Unavailable,
}

impl Valuation {
    pub fn amount(&self) -> Option<i64> {
        match self {
            Valuation::Estimate(amount) => Some(*amount),
            Valuation::Unavailable => None,
        }
    }
}

impl From<Option<i64>> for Valuation {
    fn from(amount: Option<i64>) -> Self {
        amount.map_or(Valuation::Unavailable, Valuation::Estimate)
    }
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Valuation::Estimate(amount) => write!(f, "{amount}"),
            Valuation::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// Next open house schedule. Fields are independent of each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenHouse {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl OpenHouse {
    pub fn is_scheduled(&self) -> bool {
        self.date.is_some() || self.start_time.is_some() || self.end_time.is_some()
    }
}

/// A market offer for one property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub property: Property,
    pub list_price: FieldValue,
    /// `None` until enrichment has run.
    pub valuation: Option<Valuation>,
    pub days_on_market: FieldValue,
    pub original_list_price: FieldValue,
    pub status: String,
    pub listing_id: String,
    #[serde(default)]
    pub open_house: OpenHouse,
}

impl Listing {
    /// Cache identity, inherited from the property.
    pub fn identity(&self) -> String {
        self.property.identity()
    }

    pub fn is_enriched(&self) -> bool {
        self.valuation.is_some()
    }

    /// Multi-line plain-text description.
    pub fn detailed(&self) -> String {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        format!(
            "House Details:\n{}\nStatus: {}\nList Price: {}\nValuation: {}\nListing ID: {}\nDays on Market: {}\nOriginal Price: {}\nOpen House: {} - {} to {}\n",
            self.property.detailed(),
            self.status,
            self.list_price,
            self.valuation_label(),
            self.listing_id,
            self.days_on_market,
            self.original_list_price,
            opt(&self.open_house.date),
            opt(&self.open_house.start_time),
            opt(&self.open_house.end_time),
        )
    }

    /// Human-readable valuation, distinguishing "not computed" from "unavailable".
    pub fn valuation_label(&self) -> String {
        match &self.valuation {
            Some(v) => v.to_string(),
            None => "not computed".to_string(),
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Address: {} - List Price: {} - Valuation: {}",
            self.property,
            self.list_price,
            self.valuation_label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Listing {
        Listing {
            property: Property {
                street_address: "1 Main St".into(),
                city: "Boston".into(),
                state: "MA".into(),
                zip_code: "02101".into(),
                beds: FieldValue::Integer(2),
                ..Default::default()
            },
            list_price: FieldValue::Integer(450_000),
            status: "Active".into(),
            listing_id: "73000001".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_is_property_identity() {
        let a = listing();
        let b = Listing { list_price: FieldValue::Integer(1), status: "Pending".into(), ..listing() };
        assert_eq!(a.identity(), a.property.identity());
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_valuation_states_are_distinct() {
        let mut l = listing();
        assert!(!l.is_enriched());
        assert_eq!(l.valuation_label(), "not computed");

        l.valuation = Some(Valuation::Unavailable);
        assert!(l.is_enriched());
        assert_eq!(l.valuation_label(), "unavailable");
        assert_ne!(l.valuation, Some(Valuation::Estimate(0)));
    }

    #[test]
    fn test_valuation_json_is_tagged() {
        let json = serde_json::to_string(&Valuation::Estimate(350_000)).unwrap();
        assert_eq!(json, r#"{"kind":"estimate","amount":350000}"#);
        let json = serde_json::to_string(&Valuation::Unavailable).unwrap();
        assert_eq!(json, r#"{"kind":"unavailable"}"#);
    }

    #[test]
    fn test_listing_snapshot_round_trip() {
        let mut l = listing();
        l.valuation = Some(Valuation::Estimate(440_000));
        l.open_house.date = Some("10/18/2026".into());
        let json = serde_json::to_string(&l).unwrap();
        let back: Listing = serde_json::from_str(&json).unwrap();
        assert_eq!(back, l);
    }

    #[test]
    fn test_display() {
        let l = listing();
        assert_eq!(
            l.to_string(),
            "Address: 1 Main St Boston, MA 02101 - List Price: 450000 - Valuation: not computed"
        );
    }

    #[test]
    fn test_open_house_is_scheduled() {
        let mut oh = OpenHouse::default();
        assert!(!oh.is_scheduled());
        oh.start_time = Some("11:00 AM".into());
        assert!(oh.is_scheduled());
    }
}
