//! Valuation record operations.
//!
//! Provides lookup, upsert, removal, and the TTL sweep for cached
//! valuations keyed by listing identity.

use super::VALUATION_TTL;
use super::connection::CacheDb;
use crate::{Error, Listing, Valuation};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached valuation with the listing snapshot it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRecord {
    pub identity: String,
    pub listing: Listing,
    pub valuation: Valuation,
    pub last_updated: DateTime<Utc>,
}

/// Fixed-width UTC timestamp so that lexical order is chronological.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(identity: &str, raw: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRecord { identity: identity.to_string(), reason: format!("last_updated: {e}") })
}

fn decode_record(
    identity: String, listing_json: String, valuation: Option<i64>, last_updated: String,
) -> Result<ValuationRecord, Error> {
    let listing: Listing = serde_json::from_str(&listing_json)
        .map_err(|e| Error::CorruptRecord { identity: identity.clone(), reason: format!("listing: {e}") })?;
    let last_updated = parse_timestamp(&identity, &last_updated)?;
    Ok(ValuationRecord { identity, listing, valuation: Valuation::from(valuation), last_updated })
}

type RawRow = (String, String, Option<i64>, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

impl CacheDb {
    /// Check whether a record exists for the identity.
    ///
    /// Freshness is not considered; expired records are removed by
    /// [`CacheDb::sweep_valuations`].
    pub async fn contains_valuation(&self, identity: &str) -> Result<bool, Error> {
        let identity = identity.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM valuations WHERE identity = ?1)",
                        params![identity],
                        |row| row.get(0),
                    )
                    .map_err(Error::from)?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Get the record for an identity.
    ///
    /// Returns None if the identity isn't cached. A stored snapshot that no
    /// longer decodes is reported as [`Error::CorruptRecord`].
    pub async fn get_valuation(&self, identity: &str) -> Result<Option<ValuationRecord>, Error> {
        let identity = identity.to_string();
        self.conn
            .call(move |conn| -> Result<Option<ValuationRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT identity, listing_json, valuation, last_updated
                     FROM valuations WHERE identity = ?1",
                )?;

                match stmt.query_row(params![identity], read_row) {
                    Ok((identity, listing_json, valuation, last_updated)) => {
                        decode_record(identity, listing_json, valuation, last_updated).map(Some)
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace the record for an identity.
    ///
    /// After this call exactly one record exists for `identity`, holding
    /// `listing` with `valuation` applied and `last_updated = now`.
    pub async fn upsert_valuation(
        &self, identity: &str, listing: &Listing, valuation: &Valuation, now: DateTime<Utc>,
    ) -> Result<(), Error> {
        if identity.is_empty() {
            return Err(Error::InvalidInput("identity cannot be empty".into()));
        }

        let mut snapshot = listing.clone();
        snapshot.valuation = Some(*valuation);
        let listing_json = serde_json::to_string(&snapshot).map_err(|e| Error::Serialize(e.to_string()))?;

        let identity = identity.to_string();
        let amount = valuation.amount();
        let last_updated = format_timestamp(now);

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO valuations (identity, listing_json, valuation, last_updated)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(identity) DO UPDATE SET
                        listing_json = excluded.listing_json,
                        valuation = excluded.valuation,
                        last_updated = excluded.last_updated",
                    params![identity, listing_json, amount, last_updated],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the record for an identity.
    ///
    /// Returns whether a record was removed.
    pub async fn remove_valuation(&self, identity: &str) -> Result<bool, Error> {
        let identity = identity.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM valuations WHERE identity = ?1", params![identity])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every record older than [`VALUATION_TTL`] relative to `now`.
    ///
    /// A record is expired when `now - last_updated > VALUATION_TTL`; one
    /// exactly at the boundary is kept. Returns the number of deleted records.
    pub async fn sweep_valuations(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let ttl = chrono::Duration::seconds(VALUATION_TTL.as_secs() as i64);
        let cutoff = format_timestamp(now - ttl);
        let count = self
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM valuations WHERE last_updated < ?1", params![cutoff])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)?;

        if count > 0 {
            tracing::debug!("swept {count} expired valuations");
        }
        Ok(count)
    }

    /// Number of cached records.
    pub async fn count_valuations(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM valuations", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// All cached records, most recently updated first.
    pub async fn list_valuations(&self) -> Result<Vec<ValuationRecord>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<ValuationRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT identity, listing_json, valuation, last_updated
                     FROM valuations ORDER BY last_updated DESC",
                )?;
                let rows = stmt.query_map([], read_row)?;

                let mut records = Vec::new();
                for row in rows {
                    let (identity, listing_json, valuation, last_updated) = row?;
                    records.push(decode_record(identity, listing_json, valuation, last_updated)?);
                }
                Ok(records)
            })
            .await
            .map_err(Error::from)
    }
}
