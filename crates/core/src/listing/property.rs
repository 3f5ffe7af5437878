//! Physical property record.

use super::FieldValue;
use crate::cache::hash::compute_identity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical unit as described by one row of the bulk listing export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub beds: FieldValue,
    pub baths: FieldValue,
    pub sq_ft: FieldValue,
    pub parking: FieldValue,
    pub parking_type: String,
    pub lot_size: FieldValue,
    pub home_type: String,
}

impl Property {
    /// Content-derived cache identity.
    ///
    /// Only the address fields take part, so two units at the same address
    /// with different bed counts share an identity.
    pub fn identity(&self) -> String {
        compute_identity(&self.to_string())
    }

    /// Multi-line plain-text description.
    pub fn detailed(&self) -> String {
        format!(
            "Address: {self}\nHome Type: {}\nBeds: {}\nBaths: {}\nSqFt: {}\nLot Size: {}\nParking Spaces: {}\nParking Type: {}\n",
            self.home_type, self.beds, self.baths, self.sq_ft, self.lot_size, self.parking, self.parking_type
        )
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, {} {}", self.street_address, self.city, self.state, self.zip_code)
    }
}
