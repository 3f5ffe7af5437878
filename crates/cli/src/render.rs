//! Output formats for matched listings.

use anyhow::Result;
use clap::ValueEnum;
use househunt_core::Listing;
use maud::{DOCTYPE, Markup, html};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Multi-line description per listing
    Text,
    /// Pretty-printed JSON array
    Json,
    /// Standalone HTML page with one table row per listing
    Html,
}

/// JSON shape of one match, with the identity alongside the listing.
#[derive(Serialize)]
struct MatchEntry<'a> {
    identity: String,
    #[serde(flatten)]
    listing: &'a Listing,
}

pub fn render(listings: &[Listing], format: Format) -> Result<String> {
    Ok(match format {
        Format::Text => text(listings),
        Format::Json => {
            let entries: Vec<_> = listings.iter().map(|l| MatchEntry { identity: l.identity(), listing: l }).collect();
            serde_json::to_string_pretty(&entries)?
        }
        Format::Html => page(listings).into_string(),
    })
}

fn text(listings: &[Listing]) -> String {
    if listings.is_empty() {
        return "No matching listings.".to_string();
    }
    listings.iter().map(Listing::detailed).collect::<Vec<_>>().join("\n")
}

fn row(listing: &Listing) -> Markup {
    let p = &listing.property;
    html! {
        tr {
            td { (p) }
            td { (p.home_type) }
            td { (p.beds) }
            td { (p.baths) }
            td { (p.sq_ft) }
            td { (listing.list_price) }
            td { (listing.valuation_label()) }
            td { (listing.days_on_market) }
            td { (listing.status) }
            td {
                @if listing.open_house.is_scheduled() {
                    (listing.open_house.date.as_deref().unwrap_or_default())
                    " "
                    (listing.open_house.start_time.as_deref().unwrap_or_default())
                }
            }
        }
    }
}

fn page(listings: &[Listing]) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Matching listings" }
            }
            body {
                h1 { (listings.len()) " matching listings" }
                table {
                    thead {
                        tr {
                            th { "Address" }
                            th { "Home Type" }
                            th { "Beds" }
                            th { "Baths" }
                            th { "SqFt" }
                            th { "List Price" }
                            th { "Valuation" }
                            th { "Days on Market" }
                            th { "Status" }
                            th { "Open House" }
                        }
                    }
                    tbody {
                        @for listing in listings {
                            (row(listing))
                        }
                    }
                }
            }
        }
    }
}
