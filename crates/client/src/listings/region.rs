//! Region query URL template for the bulk listing export.

use househunt_core::Error;
use url::Url;

/// Region identifier as used by the listing source.
pub type RegionId = u64;

/// Fixed filters sent with every export request.
///
/// Repeated keys are sent as repeated query pairs.
const FIXED_PARAMS: &[(&str, &str)] = &[
    ("al", "3"),
    ("isSearchFormParamsDefault", "false"),
    ("lpp", "50"),
    ("market", "boston"),
    ("mpt", "99"),
    ("no_outline", "false"),
    ("num_homes", "500"),
    ("page_number", "1"),
    ("region_type", "6"),
    ("sf", "1"),
    ("sf", "2"),
    ("sf", "3"),
    ("sf", "5"),
    ("sf", "6"),
    ("sp", "true"),
    ("status", "1"),
    ("uipt", "1"),
    ("uipt", "2"),
    ("uipt", "3"),
    ("v", "8"),
    ("render", "csv"),
];

/// Immutable export query template that varies only by region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionQuery {
    base_url: Url,
}

impl RegionQuery {
    /// Create a template over an export endpoint.
    ///
    /// Any query string already on the endpoint is replaced.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let mut base_url = Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
        base_url.set_query(None);
        base_url.set_fragment(None);
        Ok(Self { base_url })
    }

    /// Export URL for one region.
    pub fn url_for(&self, region_id: RegionId) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.extend_pairs(FIXED_PARAMS.iter().copied());
            pairs.append_pair("region_id", &region_id.to_string());
        }
        url
    }

    /// Export URLs parallel to `region_ids` (same length, same order).
    pub fn urls(&self, region_ids: &[RegionId]) -> Vec<Url> {
        region_ids.iter().map(|id| self.url_for(*id)).collect()
    }
}
