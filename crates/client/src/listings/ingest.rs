//! CSV export to listings.
//!
//! Columns are matched by header name. A row that lacks any expected column
//! is dropped, and so is a record the CSV reader cannot decode.

use std::collections::HashMap;

use csv::StringRecord;
use househunt_core::{FieldValue, Listing, OpenHouse, Property};

const ADDRESS: &str = "ADDRESS";
const CITY: &str = "CITY";
const STATE: &str = "STATE";
const ZIP: &str = "ZIP";
const BEDS: &str = "BEDS";
const BATHS: &str = "BATHS";
const PARKING_SPOTS: &str = "PARKING SPOTS";
const PARKING_TYPE: &str = "PARKING TYPE";
const SQFT: &str = "SQFT";
const LOT_SIZE: &str = "LOT SIZE";
const HOME_TYPE: &str = "HOME TYPE";
const LIST_PRICE: &str = "LIST PRICE";
const DAYS_ON_MARKET: &str = "DAYS ON MARKET";
const ORIGINAL_LIST_PRICE: &str = "ORIGINAL LIST PRICE";
const STATUS: &str = "STATUS";
const LISTING_ID: &str = "LISTING ID";
const OPEN_HOUSE_DATE: &str = "NEXT OPEN HOUSE DATE";
const OPEN_HOUSE_START: &str = "NEXT OPEN HOUSE START TIME";
const OPEN_HOUSE_END: &str = "NEXT OPEN HOUSE END TIME";

/// Header name to column position.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Self(headers.iter().enumerate().map(|(i, h)| (h.trim().to_string(), i)).collect())
    }

    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.0.get(name).and_then(|&i| record.get(i))
    }

    fn number(&self, record: &StringRecord, name: &str) -> Option<FieldValue> {
        self.get(record, name).map(FieldValue::classify)
    }

    fn text(&self, record: &StringRecord, name: &str) -> Option<String> {
        self.get(record, name).map(str::to_string)
    }

    fn optional(&self, record: &StringRecord, name: &str) -> Option<Option<String>> {
        self.get(record, name)
            .map(|v| if v.trim().is_empty() { None } else { Some(v.to_string()) })
    }

    fn listing(&self, record: &StringRecord) -> Option<Listing> {
        let property = Property {
            street_address: self.text(record, ADDRESS)?,
            city: self.text(record, CITY)?,
            state: self.text(record, STATE)?,
            zip_code: self.text(record, ZIP)?,
            beds: self.number(record, BEDS)?,
            baths: self.number(record, BATHS)?,
            sq_ft: self.number(record, SQFT)?,
            parking: self.number(record, PARKING_SPOTS)?,
            parking_type: self.text(record, PARKING_TYPE)?,
            lot_size: self.number(record, LOT_SIZE)?,
            home_type: self.text(record, HOME_TYPE)?,
        };

        Some(Listing {
            property,
            list_price: self.number(record, LIST_PRICE)?,
            valuation: None,
            days_on_market: self.number(record, DAYS_ON_MARKET)?,
            original_list_price: self.number(record, ORIGINAL_LIST_PRICE)?,
            status: self.text(record, STATUS)?,
            listing_id: self.text(record, LISTING_ID)?,
            open_house: OpenHouse {
                date: self.optional(record, OPEN_HOUSE_DATE)?,
                start_time: self.optional(record, OPEN_HOUSE_START)?,
                end_time: self.optional(record, OPEN_HOUSE_END)?,
            },
        })
    }
}

/// Parse a CSV export body into listings, skipping unusable rows.
pub fn parse_listings_csv(text: &str) -> Vec<Listing> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = match reader.headers() {
        Ok(headers) => Columns::new(headers),
        Err(e) => {
            tracing::warn!("listing export has no readable header row: {e}");
            return Vec::new();
        }
    };

    let mut listings = Vec::new();
    let mut dropped = 0usize;
    for (index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("dropping export row {}: {e}", index + 1);
                dropped += 1;
                continue;
            }
        };

        match columns.listing(&record) {
            Some(listing) => listings.push(listing),
            None => {
                tracing::debug!("dropping export row {}: missing column", index + 1);
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        tracing::debug!("parsed {} listings, dropped {dropped} rows", listings.len());
    }
    listings
}
