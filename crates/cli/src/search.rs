//! Search pipeline: fetch, prefilter, enrich, filter.

use anyhow::{Context, Result};
use househunt_client::{
    Enricher, ListingClient, ListingConfig, RegionQuery, ValuationClient, ValuationConfig, ValuationProvider,
};
use househunt_core::{AppConfig, CacheDb, Listing, SearchCriteria};
use url::Url;

pub fn region_urls(config: &AppConfig) -> Result<Vec<Url>> {
    let query = RegionQuery::new(&config.listing_base_url)?;
    Ok(query.urls(&config.regions))
}

/// Run a full search with the configured sources.
///
/// With enrichment on, the token file is checked before any listing is fetched.
pub async fn run(config: &AppConfig) -> Result<Vec<Listing>> {
    let provider = if config.enrich {
        let token_file = config.require_token_file()?;
        let valuation = ValuationConfig {
            base_url: config.valuation_base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            min_interval: config.request_interval(),
            ..ValuationConfig::from_token_file(token_file)?
        };
        Some(ValuationClient::new(valuation)?)
    } else {
        None
    };

    let listing_client =
        ListingClient::new(&ListingConfig { user_agent: config.user_agent.clone(), timeout: config.timeout() })?;
    let listings = listing_client.fetch_all(&region_urls(config)?).await?;

    let candidates = select_candidates(listings, &config.criteria);
    tracing::info!(candidates = candidates.len(), "prefilter finished");

    let mut candidates = candidates;
    if let Some(provider) = provider {
        let cache = CacheDb::open(&config.db_path)
            .await
            .with_context(|| format!("opening valuation cache {}", config.db_path.display()))?;
        let enricher = Enricher::new(cache, provider).with_concurrency(config.concurrency);
        enrich_candidates(&enricher, &mut candidates).await;
    }

    let matches = select_matches(candidates, &config.criteria);
    tracing::info!(matches = matches.len(), "search finished");
    Ok(matches)
}

/// Listings that pass every bound that does not need a valuation.
pub(crate) fn select_candidates(listings: Vec<Listing>, criteria: &SearchCriteria) -> Vec<Listing> {
    listings.into_iter().filter(|l| criteria.is_candidate(l)).collect()
}

/// Enrich candidates in place.
///
/// A listing whose valuation could not be obtained stays in the set without
/// one, so it can still match criteria that put no bound on the valuation.
pub(crate) async fn enrich_candidates<P: ValuationProvider>(enricher: &Enricher<P>, candidates: &mut [Listing]) {
    let results = enricher.enrich_all(candidates).await;
    for (listing, result) in candidates.iter().zip(results) {
        if let Err(e) = result {
            tracing::warn!("no valuation for {}: {e}", listing.property);
        }
    }

    let unenriched = candidates.iter().filter(|l| !l.is_enriched()).count();
    if unenriched > 0 {
        tracing::info!(unenriched, "continuing without some valuations");
    }
}

pub(crate) fn select_matches(listings: Vec<Listing>, criteria: &SearchCriteria) -> Vec<Listing> {
    listings.into_iter().filter(|l| criteria.matches(l)).collect()
}

/// Hand matching listings to the notification channel.
///
/// No channel is wired up yet; matches are only logged.
pub fn notify_matches(matches: &[Listing]) {
    for listing in matches {
        tracing::debug!(listing_id = %listing.listing_id, "match: {}", listing);
    }
    tracing::info!(count = matches.len(), "matches ready for notification");
}
