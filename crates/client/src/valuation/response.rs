//! Valuation search response parsing and reduction.
//!
//! The service answers with an XML document holding zero or more `result`
//! entries, each of which may carry a `zestimate/amount`. Parsing is
//! permissive: anything unreadable is treated as "no results".

use std::collections::BTreeSet;

use househunt_core::Valuation;
use serde::Deserialize;

/// Parsed search response.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub response: Option<ResponseBody>,
}

/// Status block of the response.
#[derive(Debug, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub results: Option<ResultList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultList {
    #[serde(default, rename = "result")]
    pub entries: Vec<ResultEntry>,
}

/// One candidate property.
#[derive(Debug, Default, Deserialize)]
pub struct ResultEntry {
    #[serde(default)]
    pub zpid: Option<String>,
    #[serde(default)]
    pub zestimate: Option<Estimate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Estimate {
    #[serde(default)]
    pub amount: Option<Amount>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Amount {
    #[serde(default, rename = "@currency")]
    pub currency: Option<String>,
    #[serde(default, rename = "$text")]
    pub value: Option<String>,
}

impl Amount {
    fn parse(&self) -> Option<i64> {
        let raw = self.value.as_deref()?.trim();
        raw.parse::<i64>().ok().or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.round() as i64)
        })
    }
}

impl SearchResults {
    /// Parse a response body. Malformed documents yield an empty result set.
    pub fn parse(xml: &str) -> Self {
        match quick_xml::de::from_str::<SearchResults>(xml) {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("unreadable valuation response, treating as no results: {e}");
                Self::default()
            }
        }
    }

    pub fn entries(&self) -> &[ResultEntry] {
        self.response
            .as_ref()
            .and_then(|r| r.results.as_ref())
            .map(|r| r.entries.as_slice())
            .unwrap_or_default()
    }

    pub fn result_count(&self) -> usize {
        self.entries().len()
    }

    /// Service status code, when present and numeric.
    pub fn message_code(&self) -> Option<i32> {
        self.message
            .as_ref()
            .and_then(|m| m.code.as_deref())
            .and_then(|c| c.trim().parse().ok())
    }

    /// Every readable valuation amount, in document order.
    pub fn amounts(&self) -> Vec<i64> {
        self.entries()
            .iter()
            .filter_map(|entry| entry.zestimate.as_ref()?.amount.as_ref()?.parse())
            .collect()
    }
}

/// Reduce candidate valuations to one.
///
/// Distinct amounts are collected by exact equality. None gives
/// `Unavailable`, one gives that amount, and several resolve to the maximum.
pub fn reduce(results: &SearchResults) -> Valuation {
    let distinct: BTreeSet<i64> = results.amounts().into_iter().collect();
    if distinct.len() > 1 {
        tracing::debug!("{} distinct valuations, taking the maximum", distinct.len());
    }
    Valuation::from(distinct.last().copied())
}

#[cfg(test)]
impl SearchResults {
    pub(crate) fn with_amounts(amounts: &[i64]) -> Self {
        let entries = amounts
            .iter()
            .map(|a| ResultEntry {
                zpid: None,
                zestimate: Some(Estimate {
                    amount: Some(Amount { currency: Some("USD".into()), value: Some(a.to_string()) }),
                }),
            })
            .collect();
        Self { message: None, response: Some(ResponseBody { results: Some(ResultList { entries }) }) }
    }
}
